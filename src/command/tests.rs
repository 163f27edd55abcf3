use super::parse::{classify, LineKind};
use super::*;

#[test]
fn test_reply_value_lookup() {
    let reply = Reply::from_lines(&["", "CONNECT 3", "IP:10.0.0.1"]).unwrap();
    assert_eq!(reply.len(), 3);
    assert_eq!(reply.value("CONNECT"), Some("3"));
    assert_eq!(reply.value("IP"), Some("10.0.0.1"));
    assert_eq!(reply.value("DNS"), None);
}

#[test]
fn test_reply_capacity_is_bounded() {
    let mut reply = Reply::new();
    for _ in 0..MAX_REPLY_LINES {
        reply.push_line("x").unwrap();
    }
    assert_eq!(reply.push_line("x"), Err(Error::BufferOverflow));

    let long = [b'a'; MAX_LINE_LEN + 1];
    let long = core::str::from_utf8(&long).unwrap();
    assert_eq!(Reply::new().push_line(long), Err(Error::BufferOverflow));
}

#[test]
fn test_format_request_overflow() {
    let name = [b'n'; MAX_REQUEST_LEN];
    let name = core::str::from_utf8(&name).unwrap();
    assert_eq!(
        format_request(format_args!("AT+DNSLOOKUP={}", name)),
        Err(Error::BufferOverflow)
    );
    assert_eq!(
        format_request(format_args!("AT+NCLOSE={}", 3)).unwrap().as_str(),
        "AT+NCLOSE=3"
    );
}

#[test]
fn test_error_codes() {
    assert_eq!(ErrorCode::from_line("ERROR"), Some(ErrorCode::Error));
    assert_eq!(
        ErrorCode::from_line("ERROR: INVALID INPUT"),
        Some(ErrorCode::InvalidInput)
    );
    assert_eq!(
        ErrorCode::from_line("ERROR: IP CONFIG FAIL"),
        Some(ErrorCode::IpConfigFail)
    );
    assert_eq!(
        ErrorCode::from_line("ERROR: SOMETHING NEW"),
        Some(ErrorCode::Error)
    );
    assert_eq!(ErrorCode::from_line("OK"), None);
}

#[test]
fn test_classify_lines() {
    assert!(classify("OK").is_terminal());
    assert_eq!(
        classify("ERROR: SOCKET FAILURE 1"),
        LineKind::Error(ErrorCode::SocketFailure)
    );
    assert_eq!(
        classify("DISCONNECT a"),
        LineKind::Event(Event::Disconnected(Cid::new(10).unwrap()))
    );
    assert_eq!(classify("DISASSOCIATED"), LineKind::Event(Event::Disassociated));
    // An out-of-range cid is not a notice the driver can act on.
    assert_eq!(classify("DISCONNECT z"), LineKind::Data("DISCONNECT z"));
    assert_eq!(classify("  CONNECT 2 "), LineKind::Data("CONNECT 2"));
}

#[test]
fn test_connection_manager_status_is_data() {
    for line in ["NWCONN-SUCCESS", "AT+NCMAUTO=0,1,0", "IP:10.0.0.2"] {
        assert_eq!(classify(line), LineKind::Data(line));
    }
}
