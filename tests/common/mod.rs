#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};

use gs_wifi::command::{CommandEngine, CommandError, ErrorCode, Event, Reply};
use gs_wifi::connection::MAX_CONNECTIONS;

/// Plays back canned replies and records every request.
///
/// Requests without a scripted reply get a bare `OK`.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub requests: Vec<String>,
    pub payloads: Vec<Vec<u8>>,
    replies: VecDeque<Result<Vec<&'static str>, CommandError>>,
    events: VecDeque<Event>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, lines: &[&'static str]) -> Self {
        self.replies.push_back(Ok(lines.to_vec()));
        self
    }

    pub fn err(mut self, err: CommandError) -> Self {
        self.replies.push_back(Err(err));
        self
    }

    pub fn reject(self) -> Self {
        self.err(CommandError::Rejected(ErrorCode::Error))
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    fn next_reply(&mut self) -> Result<Reply, CommandError> {
        match self.replies.pop_front() {
            Some(Ok(lines)) => Ok(Reply::from_lines(&lines).expect("scripted reply too large")),
            Some(Err(err)) => Err(err),
            None => Ok(Reply::new()),
        }
    }
}

impl CommandEngine for ScriptedEngine {
    fn execute(&mut self, request: &str) -> Result<Reply, CommandError> {
        self.requests.push(request.to_string());
        self.next_reply()
    }

    fn execute_with_payload(
        &mut self,
        request: &str,
        payload: &[u8],
    ) -> Result<Reply, CommandError> {
        self.requests.push(request.to_string());
        self.payloads.push(payload.to_vec());
        self.next_reply()
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }
}

/// A small model of the module firmware: allocates cids, keeps
/// certificates, answers lookups.
#[derive(Debug, Default)]
pub struct SimModule {
    pub requests: Vec<String>,
    pub allocated: BTreeSet<u8>,
    pub certs: BTreeSet<String>,
    /// CA that signed the certificate of every TLS peer.
    pub peer_ca: Option<String>,
    pub associated: bool,
    pub hosts: Vec<(&'static str, &'static str)>,
    pub events: VecDeque<Event>,
}

impl SimModule {
    pub fn new() -> Self {
        Self::default()
    }

    fn rejected() -> Result<Reply, CommandError> {
        Err(CommandError::Rejected(ErrorCode::Error))
    }

    fn allocate(&mut self) -> Result<Reply, CommandError> {
        let Some(cid) = (0..MAX_CONNECTIONS as u8).find(|cid| !self.allocated.contains(cid)) else {
            return Self::rejected();
        };
        self.allocated.insert(cid);
        let line = format!("CONNECT {:x}", cid);
        Ok(Reply::from_lines(&[line.as_str()]).unwrap())
    }
}

impl CommandEngine for SimModule {
    fn execute(&mut self, request: &str) -> Result<Reply, CommandError> {
        self.requests.push(request.to_string());
        let (verb, args) = request.split_once('=').unwrap_or((request, ""));

        match verb {
            "AT+NCTCP" | "AT+NCUDP" | "AT+NSUDP" => self.allocate(),
            "AT+NCLOSE" => {
                let cid = u8::from_str_radix(args, 16).unwrap();
                if self.allocated.remove(&cid) {
                    Ok(Reply::new())
                } else {
                    Self::rejected()
                }
            }
            "AT+NCLOSEALL" => {
                self.allocated.clear();
                Ok(Reply::new())
            }
            "AT+WA" => {
                self.associated = true;
                Ok(Reply::from_lines(&[
                    "    IP              SubNet         Gateway",
                    " 192.168.1.105: 255.255.255.0: 192.168.1.1",
                ])
                .unwrap())
            }
            "AT+WD" => {
                self.associated = false;
                self.allocated.clear();
                Ok(Reply::new())
            }
            "AT+TCERTDEL" => {
                if self.certs.remove(args) {
                    Ok(Reply::new())
                } else {
                    Self::rejected()
                }
            }
            "AT+SSLOPEN" => {
                let (cid, name) = args.split_once(',').unwrap();
                let cid = u8::from_str_radix(cid, 16).unwrap();
                let trusted = self.certs.contains(name) && self.peer_ca.as_deref() == Some(name);
                if self.allocated.contains(&cid) && trusted {
                    Ok(Reply::new())
                } else {
                    self.allocated.remove(&cid);
                    Self::rejected()
                }
            }
            "AT+DNSLOOKUP" => match self.hosts.iter().find(|(name, _)| *name == args) {
                Some((_, ip)) => {
                    let line = format!("IP:{}", ip);
                    Ok(Reply::from_lines(&[line.as_str()]).unwrap())
                }
                None => Self::rejected(),
            },
            _ => Ok(Reply::new()),
        }
    }

    fn execute_with_payload(
        &mut self,
        request: &str,
        payload: &[u8],
    ) -> Result<Reply, CommandError> {
        self.requests.push(request.to_string());
        let args = request.strip_prefix("AT+TCERTADD=").unwrap();
        let mut fields = args.split(',');
        let name = fields.next().unwrap();
        let len: usize = fields.nth(1).unwrap().parse().unwrap();
        if len != payload.len() {
            return Self::rejected();
        }
        self.certs.insert(name.to_string());
        Ok(Reply::new())
    }

    fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }
}
