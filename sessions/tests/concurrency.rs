use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use engine::{Application, ObjectId};
use schema::{PropertyDef, TypeDef, TypeRegistry, Value};
use serde_json::json;
use sessions::{ManagerConfig, SessionError, SessionId, SessionManager};

const COUNTER: &str = "test.Counter";
const RECORDER: &str = "test.Recorder";

fn types() -> TypeRegistry {
    TypeRegistry::new(vec![TypeDef::new(COUNTER)
        .property(PropertyDef::tracked("count", Value::Int(0)))
        .event("Increment")])
    .unwrap()
}

const NOTIFY: &[u8] = br#"{"operations": [["notify", "w1", "Increment", {}]]}"#;
const EMPTY: &[u8] = br#"{"operations": []}"#;

/// Counter whose handler reads, pauses, then writes back. Overlapping
/// requests on one session would lose an increment.
fn slow_counter_app(in_flight: Arc<AtomicBool>, overlaps: Arc<AtomicUsize>) -> Arc<Application> {
    let app = Application::new(types()).with_entry_point(move |ui| {
        let counter = ui.create(COUNTER, None)?;
        let in_flight = Arc::clone(&in_flight);
        let overlaps = Arc::clone(&overlaps);
        ui.on(counter, "Increment", move |ui, event| {
            if in_flight.swap(true, Ordering::SeqCst) {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            let count = ui.get(event.target, "count")?.as_int().unwrap_or(0);
            thread::sleep(Duration::from_millis(20));
            let result = ui.set(event.target, "count", count + 1);
            in_flight.store(false, Ordering::SeqCst);
            result
        })
    });
    Arc::new(app)
}

#[test]
fn same_session_requests_are_serialized() {
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(SessionManager::new(
        slow_counter_app(Arc::clone(&in_flight), Arc::clone(&overlaps)),
        &ManagerConfig::for_testing(),
    ));
    let id = manager.create_session();
    manager.handle(id, EMPTY).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.handle(id, NOTIFY).unwrap())
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    let (count, preserved) = manager
        .with_session(id, |session| {
            let counter = ObjectId::new(1);
            (
                session.registry().resolve(counter).unwrap().get("count").cloned(),
                session.preserved().get(counter, "count").cloned(),
            )
        })
        .unwrap();
    assert_eq!(count, Some(Value::Int(4)));
    assert_eq!(preserved, Some(Value::Int(4)));
}

/// Recorder whose `Hold` handler blocks until `release` is set and whose
/// `Record` handler appends the notify's `value` to `applied`.
fn recorder_app(release: Arc<AtomicBool>, applied: Arc<Mutex<Vec<i64>>>) -> Arc<Application> {
    let types = TypeRegistry::new(vec![TypeDef::new(RECORDER).event("Hold").event("Record")])
        .unwrap();
    let app = Application::new(types).with_entry_point(move |ui| {
        let recorder = ui.create(RECORDER, None)?;
        let release = Arc::clone(&release);
        ui.on(recorder, "Hold", move |_, _| {
            wait_for(|| release.load(Ordering::SeqCst));
            Ok(())
        })?;
        let applied = Arc::clone(&applied);
        ui.on(recorder, "Record", move |_, event| {
            let value = event.property("value").and_then(Value::as_int);
            applied.lock().unwrap().extend(value);
            Ok(())
        })
    });
    Arc::new(app)
}

fn notify_body(event: &str, value: i64) -> Vec<u8> {
    serde_json::to_vec(&json!({"operations": [["notify", "w1", event, {"value": value}]]}))
        .unwrap()
}

fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached");
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for_queue(manager: &SessionManager, id: SessionId, len: u64) {
    wait_for(|| manager.queued_requests(id).unwrap() == len);
}

#[test]
fn same_session_requests_apply_in_arrival_order() {
    let release = Arc::new(AtomicBool::new(false));
    let applied = Arc::new(Mutex::new(Vec::new()));
    let manager = Arc::new(SessionManager::new(
        recorder_app(Arc::clone(&release), Arc::clone(&applied)),
        &ManagerConfig::for_testing(),
    ));
    let id = manager.create_session();
    manager.handle(id, EMPTY).unwrap();

    let spawn = |body: Vec<u8>| {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.handle(id, &body).unwrap())
    };
    let mut workers = vec![spawn(notify_body("Hold", 0))];
    wait_for_queue(&manager, id, 1);
    for value in 1..=6 {
        workers.push(spawn(notify_body("Record", value)));
        wait_for_queue(&manager, id, value as u64 + 1);
    }
    release.store(true, Ordering::SeqCst);
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(*applied.lock().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(manager.queued_requests(id).unwrap(), 0);
}

#[test]
fn different_sessions_run_in_parallel() {
    let arrived = Arc::new(AtomicUsize::new(0));
    let saw_other = Arc::new(AtomicUsize::new(0));
    let app = {
        let arrived = Arc::clone(&arrived);
        let saw_other = Arc::clone(&saw_other);
        Application::new(types()).with_entry_point(move |ui| {
            let counter = ui.create(COUNTER, None)?;
            let arrived = Arc::clone(&arrived);
            let saw_other = Arc::clone(&saw_other);
            ui.on(counter, "Increment", move |_, _| {
                arrived.fetch_add(1, Ordering::SeqCst);
                let deadline = Instant::now() + Duration::from_secs(5);
                while Instant::now() < deadline {
                    if arrived.load(Ordering::SeqCst) >= 2 {
                        saw_other.fetch_add(1, Ordering::SeqCst);
                        break;
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                Ok(())
            })
        })
    };
    let manager = Arc::new(SessionManager::new(
        Arc::new(app),
        &ManagerConfig::for_testing(),
    ));
    let sessions = [manager.create_session(), manager.create_session()];
    for id in sessions {
        manager.handle(id, EMPTY).unwrap();
    }

    let workers: Vec<_> = sessions
        .into_iter()
        .map(|id| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.handle(id, NOTIFY).unwrap())
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(saw_other.load(Ordering::SeqCst), 2);
}

#[test]
fn idle_sessions_expire() {
    let config = ManagerConfig {
        time_to_idle: 50,
        ..ManagerConfig::for_testing()
    };
    let manager = SessionManager::new(Arc::new(Application::new(types())), &config);
    let id = manager.create_session();
    assert!(manager.contains(id));

    thread::sleep(Duration::from_millis(200));
    assert!(!manager.contains(id));
    assert_eq!(manager.session_count(), 0);
    assert_eq!(
        manager.handle(id, EMPTY).unwrap_err(),
        SessionError::UnknownSession { id }
    );
}

#[test]
fn sessions_do_not_share_state() {
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let manager = SessionManager::new(
        slow_counter_app(in_flight, overlaps),
        &ManagerConfig::for_testing(),
    );
    let a = manager.create_session();
    let b = manager.create_session();
    manager.handle(a, EMPTY).unwrap();
    manager.handle(b, EMPTY).unwrap();
    manager.handle(a, NOTIFY).unwrap();

    let count_of = |id| {
        manager
            .with_session(id, |session| {
                session
                    .registry()
                    .resolve(ObjectId::new(1))
                    .unwrap()
                    .get("count")
                    .cloned()
            })
            .unwrap()
    };
    assert_eq!(count_of(a), Some(Value::Int(1)));
    assert_eq!(count_of(b), None);
}
