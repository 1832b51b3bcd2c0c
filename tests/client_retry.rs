//! Client retry behaviour against misbehaving peers.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use sshdesk::{ApiClient, ClientConfig, ClientError, Message};

fn unused_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

fn fast_config(addr: String) -> ClientConfig {
    ClientConfig {
        dial_timeout: Duration::from_millis(500),
        read_timeout: Duration::from_millis(500),
        write_timeout: Duration::from_millis(500),
        ..ClientConfig::new(addr)
    }
}

#[test]
fn test_refused_address_exhausts_attempts() {
    let client = ApiClient::new(fast_config(unused_addr()));

    let start = Instant::now();
    let err = client.ping().unwrap_err();
    let elapsed = start.elapsed();

    match &err {
        ClientError::Exhausted { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected exhausted, got {:?}", other),
    }
    assert!(err.to_string().contains("3 attempts"), "{}", err);
    assert_eq!(err.exit_code(), 20);
    // 100ms + 200ms of backoff, none after the last attempt
    assert!(elapsed >= Duration::from_millis(300), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2000), "{:?}", elapsed);
}

#[test]
fn test_single_attempt_when_retries_is_one() {
    let config = ClientConfig {
        retries: 1,
        ..fast_config(unused_addr())
    };
    let err = ApiClient::new(config).ping().unwrap_err();
    assert!(matches!(err, ClientError::Exhausted { attempts: 1, .. }));
}

#[test]
fn test_dropped_first_connection_is_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        // First connection: read the request, then hang up without a reply.
        let (stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();
        drop(stream);

        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();
        stream
            .write_all(b"{\"code\":0,\"ok\":true,\"data\":{\"message\":\"pong\"}}\n")
            .unwrap();
        line
    });

    let response = ApiClient::new(fast_config(addr)).ping().unwrap();
    assert!(response.is_success());
    assert_eq!(response.data.unwrap()["message"], "pong");

    // The retried attempt carried the same request.
    assert_eq!(server.join().unwrap(), "{\"type\":\"ping\"}\n");
}

#[test]
fn test_silent_server_times_out_each_attempt() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        let mut held = Vec::new();
        for _ in 0..2 {
            let (stream, _) = listener.accept().unwrap();
            held.push(stream);
        }
        // Keep the connections open until the client gives up.
        thread::sleep(Duration::from_millis(800));
    });

    let config = ClientConfig {
        retries: 2,
        read_timeout: Duration::from_millis(200),
        ..fast_config(addr)
    };
    let start = Instant::now();
    let err = ApiClient::new(config).ping().unwrap_err();

    assert!(matches!(err, ClientError::Exhausted { attempts: 2, .. }), "{:?}", err);
    assert!(start.elapsed() < Duration::from_millis(2000));
    server.join().unwrap();
}

#[test]
fn test_garbage_reply_is_not_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line).unwrap();
        stream.write_all(b"definitely not json\n").unwrap();

        // A second attempt would show up here.
        listener.set_nonblocking(true).unwrap();
        thread::sleep(Duration::from_millis(300));
        listener.accept().is_err()
    });

    let err = ApiClient::new(fast_config(addr)).send(&Message::new("ping")).unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "{:?}", err);
    assert_eq!(err.exit_code(), 30);
    assert!(server.join().unwrap(), "client retried after a decode error");
}
