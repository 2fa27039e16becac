//! Integration tests: queue manager sessions against the in-memory transport.

use std::sync::Arc;

use open_mainframe_mq::constants::*;
use open_mainframe_mq::{
    Completion, ConnectOptions, GetOptions, InMemoryProvider, Message, MqError, MqPersistence,
    Mqmd, OpenMode, PutOptions, Queue, QueueManager, QueueOptions, Wait,
};

fn provider_with(queues: &[&str]) -> InMemoryProvider {
    let provider = InMemoryProvider::new("QM1");
    for q in queues {
        provider.define_queue(q);
    }
    provider
}

fn connected(provider: &InMemoryProvider, options: ConnectOptions) -> QueueManager {
    let mut qmgr = QueueManager::with_provider(options, Arc::new(provider.clone()));
    assert_eq!(qmgr.connect().unwrap(), Completion::Ok);
    qmgr
}

fn put_text(queue: &mut Queue, text: &str, options: &PutOptions) {
    let mut message = Message::new(text);
    assert_eq!(queue.put(&mut message, options).unwrap(), Completion::Ok);
}

/// Test: every reopen after a close gets a working handle and none leak.
#[test]
fn reopen_after_close() {
    let provider = provider_with(&["TEST.Q"]);
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut queue = qmgr.queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output));

    for round in 0..3 {
        assert_eq!(queue.open().unwrap(), Completion::Ok);
        assert!(queue.is_open());
        assert_eq!(provider.open_handles(), 1);
        put_text(&mut queue, &format!("round {round}"), &PutOptions::default());
        assert_eq!(queue.close().unwrap(), Completion::Ok);
        assert!(!queue.is_open());
        assert_eq!(provider.open_handles(), 0);
    }
    assert_eq!(queue.close().unwrap(), Completion::Ok);
    assert_eq!(provider.depth("TEST.Q"), Some(3));
}

/// Test: opening an open queue is a state error.
#[test]
fn open_twice_is_rejected() {
    let provider = provider_with(&["TEST.Q"]);
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut queue = qmgr
        .open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output))
        .unwrap();
    let err = queue.open().unwrap_err();
    assert!(matches!(err, MqError::QueueAlreadyOpen { ref queue } if queue == "TEST.Q"));
    assert_eq!(provider.open_handles(), 1);
}

/// Test: disconnect closes every open queue and later calls fail with a
/// state error.
#[test]
fn disconnect_invalidates_queues() {
    let provider = provider_with(&["A.Q", "B.Q", "C.Q"]);
    let mut qmgr = connected(&provider, ConnectOptions::local("QM1"));

    let mut queues: Vec<Queue> = ["A.Q", "B.Q", "C.Q"]
        .iter()
        .map(|name| {
            qmgr.open_queue(QueueOptions::new(*name).mode(OpenMode::InputShared).open_options(MQOO_OUTPUT))
                .unwrap()
        })
        .collect();
    assert_eq!(qmgr.open_queue_count(), 3);
    assert_eq!(provider.open_handles(), 3);

    assert_eq!(qmgr.disconnect().unwrap(), Completion::Ok);
    assert!(!qmgr.is_connected());
    assert_eq!(provider.open_handles(), 0);
    assert_eq!(provider.connection_count(), 0);

    for queue in &mut queues {
        assert!(!queue.is_open());
        let err = queue.put(&mut Message::new("late"), &PutOptions::default()).unwrap_err();
        assert!(err.is_state_error());
        assert!(matches!(err, MqError::QueueNotOpen { operation: "put", .. }));
        let err = queue.get(&mut Message::default(), &GetOptions::default()).unwrap_err();
        assert!(matches!(err, MqError::QueueNotOpen { operation: "get", .. }));
        assert_eq!(queue.close().unwrap(), Completion::Ok);
    }
}

/// Test: a no-wait get on an empty queue is NoMessage under either policy.
#[test]
fn empty_queue_is_not_an_error() {
    for raise in [true, false] {
        let provider = provider_with(&["EMPTY.Q"]);
        let options = ConnectOptions {
            exception_on_error: raise,
            ..ConnectOptions::local("QM1")
        };
        let qmgr = connected(&provider, options);
        let mut queue = qmgr
            .open_queue(QueueOptions::new("EMPTY.Q").mode(OpenMode::Input))
            .unwrap();

        let mut message = Message::new("stale");
        let completion = queue.get(&mut message, &GetOptions::default()).unwrap();
        assert_eq!(completion, Completion::NoMessage);
        assert_eq!(queue.reason_code(), MQRC_NO_MSG_AVAILABLE);
        assert_eq!(queue.reason(), "MQRC_NO_MSG_AVAILABLE");
        assert!(message.data.is_empty());

        let completion = queue
            .get(&mut message, &GetOptions::wait(Wait::Millis(20)))
            .unwrap();
        assert_eq!(completion, Completion::NoMessage);
    }
}

/// Test: each() drains the queue in put order and then stops.
#[test]
fn each_yields_in_order() {
    let provider = provider_with(&["ORDER.Q"]);
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));

    let mut output = qmgr
        .open_queue(QueueOptions::new("ORDER.Q").mode(OpenMode::Output))
        .unwrap();
    for i in 1..=5 {
        put_text(&mut output, &format!("M{i}"), &PutOptions::default());
    }

    let mut browser = qmgr
        .open_queue(QueueOptions::new("ORDER.Q").mode(OpenMode::Browse))
        .unwrap();
    let browsed: Vec<String> = browser
        .each(GetOptions::default())
        .map(|m| m.unwrap().text().unwrap().to_string())
        .collect();
    assert_eq!(browsed, ["M1", "M2", "M3", "M4", "M5"]);
    assert_eq!(provider.depth("ORDER.Q"), Some(5));

    let mut input = qmgr
        .open_queue(QueueOptions::new("ORDER.Q").mode(OpenMode::Input))
        .unwrap();
    let taken: Vec<String> = input
        .each(GetOptions::default())
        .map(|m| m.unwrap().text().unwrap().to_string())
        .collect();
    assert_eq!(taken, ["M1", "M2", "M3", "M4", "M5"]);
    assert_eq!(provider.depth("ORDER.Q"), Some(0));
    assert_eq!(input.each(GetOptions::default()).count(), 0);
}

/// Test: syncpoint puts show up on commit and vanish on backout.
#[test]
fn commit_and_backout_visibility() {
    let provider = provider_with(&["UOW.Q"]);
    let mut qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut output = qmgr
        .open_queue(QueueOptions::new("UOW.Q").mode(OpenMode::Output))
        .unwrap();
    let mut input = qmgr
        .open_queue(QueueOptions::new("UOW.Q").mode(OpenMode::InputShared))
        .unwrap();

    assert_eq!(qmgr.begin().unwrap(), Completion::Ok);
    for i in 0..3 {
        put_text(&mut output, &format!("kept {i}"), &PutOptions::sync());
    }
    assert!(qmgr.in_unit_of_work());
    assert_eq!(qmgr.commit().unwrap(), Completion::Ok);
    assert!(!qmgr.in_unit_of_work());
    assert_eq!(input.each(GetOptions::default()).count(), 3);

    assert_eq!(qmgr.begin().unwrap(), Completion::Ok);
    for i in 0..3 {
        put_text(&mut output, &format!("dropped {i}"), &PutOptions::sync());
    }
    assert_eq!(qmgr.backout().unwrap(), Completion::Ok);
    let mut message = Message::default();
    assert_eq!(
        input.get(&mut message, &GetOptions::default()).unwrap(),
        Completion::NoMessage
    );
    assert_eq!(provider.depth("UOW.Q"), Some(0));
}

/// Test: a syncpoint get that is backed out returns to the queue with its
/// backout count raised.
#[test]
fn backed_out_get_is_redelivered() {
    let provider = provider_with(&["REDO.Q"]);
    let mut qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut queue = qmgr
        .open_queue(QueueOptions::new("REDO.Q").mode(OpenMode::InputShared).open_options(MQOO_OUTPUT))
        .unwrap();
    put_text(&mut queue, "retry me", &PutOptions::default());

    let sync_get = GetOptions {
        sync: true,
        ..Default::default()
    };
    let mut message = Message::default();
    assert_eq!(queue.get(&mut message, &sync_get).unwrap(), Completion::Ok);
    assert!(qmgr.in_unit_of_work());
    assert_eq!(qmgr.backout().unwrap(), Completion::Ok);

    assert_eq!(queue.get(&mut message, &GetOptions::default()).unwrap(), Completion::Ok);
    assert_eq!(message.text(), Some("retry me"));
    assert_eq!(message.descriptor.backout_count, 1);
}

/// Test: an unloadable library is a binding error and leaves the manager
/// disconnected.
#[test]
fn binding_failure_leaves_manager_disconnected() {
    let options = ConnectOptions {
        library_path: Some("/nonexistent/libmqic_r.so".into()),
        ..ConnectOptions::client("QM1", "localhost(1414)")
    };
    let mut qmgr = QueueManager::new(options);
    let err = qmgr.connect().unwrap_err();
    assert!(err.is_binding_error());
    assert!(!qmgr.is_connected());
    assert!(matches!(qmgr.begin(), Err(MqError::NotConnected { .. })));

    let err = qmgr.connect().unwrap_err();
    assert!(err.is_binding_error());
}

/// Test: a refused connect follows the error policy and keeps nothing.
#[test]
fn refused_connect_follows_policy() {
    let provider = InMemoryProvider::new("QM1");
    provider.set_available(false);

    let mut raising = QueueManager::with_provider(ConnectOptions::local("QM1"), Arc::new(provider.clone()));
    let err = raising.connect().unwrap_err();
    assert_eq!(err.status().map(|s| s.reason_code), Some(MQRC_Q_MGR_NOT_AVAILABLE));
    assert!(!raising.is_connected());

    let quiet = ConnectOptions {
        exception_on_error: false,
        ..ConnectOptions::local("QM1")
    };
    let mut polling = QueueManager::with_provider(quiet, Arc::new(provider.clone()));
    let completion = polling.connect().unwrap();
    assert!(matches!(completion, Completion::Failed(_)));
    assert_eq!(polling.comp_code(), MQCC_FAILED);
    assert_eq!(polling.reason_code(), MQRC_Q_MGR_NOT_AVAILABLE);
    assert!(!polling.is_connected());
    assert_eq!(provider.connection_count(), 0);
}

/// Test: clear() restores the default descriptor and an empty payload.
#[test]
fn clear_restores_defaults() {
    let mut message = Message::from_fields([
        ("data", "payload".into()),
        ("persistence", true.into()),
        ("reply_to_q", "SOMEWHERE".into()),
        ("priority", 7.into()),
    ])
    .unwrap();
    message.clear();
    assert!(message.data.is_empty());
    assert!(message.headers.is_empty());
    assert_eq!(message.descriptor, Mqmd::default());
    assert_eq!(message, Message::default());
}

/// Test: a message larger than the receive buffer is still delivered whole.
#[test]
fn large_message_grows_buffer() {
    let provider = provider_with(&["BIG.Q"]);
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut queue = qmgr
        .open_queue(QueueOptions::new("BIG.Q").mode(OpenMode::Input).open_options(MQOO_OUTPUT))
        .unwrap();
    let payload = vec![b'x'; 10_000];
    let mut message = Message::new(payload.clone());
    assert!(queue.put(&mut message, &PutOptions::default()).unwrap().is_ok());

    let options = GetOptions {
        buffer_size: 16,
        ..Default::default()
    };
    let mut received = Message::default();
    assert_eq!(queue.get(&mut received, &options).unwrap(), Completion::Ok);
    assert_eq!(received.data, payload);
}

/// Test: accepting truncation returns the first bytes with a warning.
#[test]
fn accepted_truncation_is_reported() {
    let provider = provider_with(&["BIG.Q"]);
    let options = ConnectOptions {
        exception_on_error: false,
        ..ConnectOptions::local("QM1")
    };
    let qmgr = connected(&provider, options);
    let mut queue = qmgr
        .open_queue(QueueOptions::new("BIG.Q").mode(OpenMode::Input).open_options(MQOO_OUTPUT))
        .unwrap();
    put_text(&mut queue, "truncated body", &PutOptions::default());

    let options = GetOptions {
        buffer_size: 9,
        accept_truncated: true,
        ..Default::default()
    };
    let mut received = Message::default();
    let completion = queue.get(&mut received, &options).unwrap();
    assert_eq!(
        completion.status().map(|s| s.reason_code),
        Some(MQRC_TRUNCATED_MSG_ACCEPTED)
    );
    assert_eq!(queue.comp_code(), MQCC_WARNING);
    assert_eq!(received.text(), Some("truncated"));
    assert_eq!(provider.depth("BIG.Q"), Some(0));
}

/// Test: each() hands over truncated messages it has already taken.
#[test]
fn each_yields_accepted_truncations() {
    let provider = provider_with(&["BIG.Q"]);
    let options = ConnectOptions {
        exception_on_error: false,
        ..ConnectOptions::local("QM1")
    };
    let qmgr = connected(&provider, options);
    let mut queue = qmgr
        .open_queue(QueueOptions::new("BIG.Q").mode(OpenMode::Input).open_options(MQOO_OUTPUT))
        .unwrap();
    put_text(&mut queue, "truncated body", &PutOptions::default());
    put_text(&mut queue, "tiny", &PutOptions::default());

    let options = GetOptions {
        buffer_size: 4,
        accept_truncated: true,
        ..Default::default()
    };
    let taken: Vec<String> = queue
        .each(options)
        .map(|m| m.unwrap().text().unwrap().to_string())
        .collect();
    assert_eq!(taken, ["trun", "tiny"]);
    assert_eq!(provider.depth("BIG.Q"), Some(0));
}

/// Test: open_with closes the queue after the closure runs.
#[test]
fn open_with_closes() {
    let provider = provider_with(&["SCOPED.Q"]);
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let name = Queue::open_with(&qmgr, QueueOptions::new("SCOPED.Q").mode(OpenMode::Output), |q| {
        put_text(q, "inside", &PutOptions::default());
        Ok(q.name().to_string())
    })
    .unwrap();
    assert_eq!(name, "SCOPED.Q");
    assert_eq!(provider.open_handles(), 0);
    assert_eq!(provider.depth("SCOPED.Q"), Some(1));

    let err = Queue::open_with(&qmgr, QueueOptions::new("MISSING.Q").mode(OpenMode::Output), |_| Ok(()))
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.reason_code), Some(MQRC_UNKNOWN_OBJECT_NAME));
}

/// Test: opening a model queue creates a dynamic queue that goes away on close.
#[test]
fn model_queue_creates_dynamic_queue() {
    let provider = InMemoryProvider::new("QM1");
    provider.define_model_queue("APP.MODEL");
    let qmgr = connected(&provider, ConnectOptions::local("QM1"));
    let mut queue = qmgr
        .open_queue(
            QueueOptions::new("APP.MODEL")
                .mode(OpenMode::Input)
                .dynamic_q_name("APP.REPLY.*"),
        )
        .unwrap();
    let dynamic = queue.name().to_string();
    assert!(dynamic.starts_with("APP.REPLY."));
    assert!(provider.queue_exists(&dynamic));

    assert!(queue.close().unwrap().is_ok());
    assert!(!provider.queue_exists(&dynamic));
}

/// Test: a persistent "hello" put in one client session is read in the next.
#[test]
fn example_session() {
    let provider = provider_with(&["TEST.Q"]);
    let options = ConnectOptions::client("QM1", "localhost(1414)");

    QueueManager::with_provider(options.clone(), Arc::new(provider.clone()))
        .scoped(|qmgr| {
            assert_eq!(qmgr.name(), "QM1");
            let mut queue = qmgr.open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Output))?;
            let mut message = Message::from_fields([("data", "hello".into()), ("persistence", true.into())])?;
            assert!(queue.put(&mut message, &PutOptions::default())?.is_ok());
            assert!(queue.close()?.is_ok());
            Ok(())
        })
        .unwrap();
    assert_eq!(provider.connection_count(), 0);

    let received = QueueManager::with_provider(options, Arc::new(provider.clone()))
        .scoped(|qmgr| {
            let mut queue = qmgr.open_queue(QueueOptions::new("TEST.Q").mode(OpenMode::Input))?;
            let mut message = Message::default();
            let completion = queue.get(&mut message, &GetOptions::wait(Wait::NoWait))?;
            assert_eq!(completion, Completion::Ok);
            Ok(message)
        })
        .unwrap();
    assert_eq!(received.text(), Some("hello"));
    assert_eq!(received.descriptor.persistence, MqPersistence::Persistent);
    assert!(received.put_timestamp().is_some());
}

/// Test: options loaded from a TOML file drive a connection.
#[test]
fn connect_from_config_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "q_mgr_name = \"QM1\"\nmode = \"local\"\nexception_on_error = false").unwrap();
    let options = ConnectOptions::from_file(file.path()).unwrap();

    let provider = provider_with(&["CFG.Q"]);
    let mut qmgr = connected(&provider, options);
    assert!(!qmgr.exception_on_error());
    let mut queue = qmgr.queue(QueueOptions::new("NOPE.Q").mode(OpenMode::Output));
    let completion = queue.open().unwrap();
    assert!(matches!(completion, Completion::Failed(s) if s.reason_code == MQRC_UNKNOWN_OBJECT_NAME));
    assert!(!queue.is_open());
    assert_eq!(qmgr.disconnect().unwrap(), Completion::Ok);
}
