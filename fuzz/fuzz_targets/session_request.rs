#![no_main]

use std::sync::{Arc, OnceLock};

use engine::{Application, Session};
use libfuzzer_sys::fuzz_target;

fn app() -> Arc<Application> {
    static APP: OnceLock<Arc<Application>> = OnceLock::new();
    APP.get_or_init(|| Arc::new(widgets::demo_application().unwrap()))
        .clone()
}

fuzz_target!(|data: &[u8]| {
    let mut session = Session::new(app());
    let _ = session.handle(br#"{"operations": []}"#);

    // Arbitrary requests must never panic and must leave the session usable.
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = (data[idx] as usize % 200).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let _ = session.handle(&data[idx..end]);
        idx = end;
    }
    let _ = session.handle(br#"{"operations": []}"#);
});
