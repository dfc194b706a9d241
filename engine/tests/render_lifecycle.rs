use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use engine::{
    Application, EngineConfig, MapResolver, ObjectId, Phase, Session, SyncError, SyncResult, Ui,
};
use protocol::{ClientMessage, Limits};
use schema::{ImageRef, PropertyDef, TypeDef, TypeRegistry, Value};
use serde_json::{json, Value as Json};

const SHELL: &str = "rwt.widgets.Shell";
const LABEL: &str = "rwt.widgets.Label";
const BUTTON: &str = "rwt.widgets.Button";
const TEXT: &str = "rwt.widgets.Text";

fn types() -> TypeRegistry {
    TypeRegistry::new(vec![
        TypeDef::new(SHELL).property(PropertyDef::tracked("visible", Value::Bool(false))),
        TypeDef::new(LABEL)
            .property(PropertyDef::tracked("text", Value::Null))
            .property(PropertyDef::tracked("image", Value::Null))
            .property(PropertyDef::tracked("leftMargin", Value::Int(3)))
            .property(PropertyDef::create_only("markupEnabled", Value::Bool(false)))
            .method("flash"),
        TypeDef::new(BUTTON)
            .property(PropertyDef::tracked("text", Value::Null))
            .event("Selection"),
        TypeDef::new(TEXT)
            .property(PropertyDef::tracked("text", Value::from("")).client_writable())
            .event("Modify"),
    ])
    .unwrap()
}

fn app_with<F>(config: EngineConfig, entry_point: F) -> Arc<Application>
where
    F: Fn(&mut Ui<'_>) -> SyncResult<()> + Send + Sync + 'static,
{
    let mut resolver = MapResolver::new();
    resolver.register("icons/logo.png", "rwt-resources/logo.png");
    Arc::new(
        Application::new(types())
            .with_resolver(resolver)
            .with_config(config)
            .with_entry_point(entry_point),
    )
}

/// Shell w1 with label w2.
fn label_app() -> Arc<Application> {
    app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        ui.create(LABEL, Some(shell))?;
        Ok(())
    })
}

fn request(session: &mut Session, body: &Json) -> Json {
    let bytes = session.service(&serde_json::to_vec(body).unwrap()).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn empty_request(session: &mut Session) -> Json {
    request(session, &json!({"head": {}, "operations": []}))
}

/// Runs a request whose `ProcessAction` applies `action`.
fn act<F>(session: &mut Session, action: F) -> Json
where
    F: FnOnce(&mut Ui<'_>) -> SyncResult<()>,
{
    let mut cycle = session.begin();
    cycle.read_data(&ClientMessage::default()).unwrap();
    cycle.process_action().unwrap();
    action(&mut cycle.ui().unwrap()).unwrap();
    cycle.render().unwrap();
    serde_json::from_slice(&cycle.write_response().unwrap()).unwrap()
}

const W1: ObjectId = ObjectId::new(1);
const W2: ObjectId = ObjectId::new(2);

#[test]
fn text_change_emits_one_set_then_nothing() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);

    let response = act(&mut session, |ui| ui.set(W2, "text", "foo"));
    assert_eq!(response["operations"], json!([["set", "w2", {"text": "foo"}]]));
    assert_eq!(session.preserved().get(W2, "text"), Some(&Value::from("foo")));

    let response = empty_request(&mut session);
    assert_eq!(response["operations"], json!([]));
}

#[test]
fn create_omits_default_values() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let label = ui.create_with_style(LABEL, Some(shell), &["SHADOW_IN"])?;
        ui.set(label, "leftMargin", 3)?;
        ui.set(label, "markupEnabled", true)
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    assert_eq!(
        response["operations"],
        json!([
            ["create", "w1", SHELL, {}],
            ["create", "w2", LABEL, {"parent": "w1", "style": ["SHADOW_IN"], "markupEnabled": true}]
        ])
    );
}

#[test]
fn parent_is_created_before_child() {
    let mut session = Session::new(label_app());
    let response = empty_request(&mut session);
    let operations = response["operations"].as_array().unwrap();
    assert_eq!(operations[0][1], "w1");
    assert_eq!(operations[1][1], "w2");
    assert_eq!(operations[1][3]["parent"], "w1");
}

#[test]
fn create_only_property_is_not_rendered_as_change() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = act(&mut session, |ui| ui.set(W2, "markupEnabled", true));
    assert_eq!(response["operations"], json!([]));
}

#[test]
fn reset_to_null_is_encoded() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    act(&mut session, |ui| {
        ui.set(W2, "image", ImageRef::new("icons/logo.png", 100, 50))
    });
    let response = act(&mut session, |ui| ui.set(W2, "image", Value::Null));
    assert_eq!(response["operations"], json!([["set", "w2", {"image": null}]]));
}

#[test]
fn destroyed_reference_is_reported_and_processing_continues() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = act(&mut session, |ui| {
        let label = ui.create(LABEL, Some(W1))?;
        ui.destroy(label);
        ui.create(TEXT, Some(W1))?;
        Ok(())
    });
    assert_eq!(response["operations"].as_array().unwrap().len(), 1);

    let response = request(
        &mut session,
        &json!({"operations": [
            ["set", "w3", {"text": "gone"}],
            ["set", "w4", {"text": "typed"}]
        ]}),
    );
    let errors = response["head"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], "UnknownObjectReference");
    assert_eq!(errors[0]["target"], "w3");
    let text = session.registry().resolve(ObjectId::new(4)).unwrap();
    assert_eq!(text.get("text"), Some(&Value::from("typed")));
}

#[test]
fn client_values_are_not_echoed() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        ui.create(TEXT, None)?;
        Ok(())
    });
    let mut session = Session::new(app);
    empty_request(&mut session);
    let response = request(
        &mut session,
        &json!({"operations": [["set", "w1", {"text": "typed"}]]}),
    );
    assert_eq!(response["operations"], json!([]));
    assert!(response["head"].get("errors").is_none());
}

#[test]
fn read_only_property_from_client_is_malformed() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = request(
        &mut session,
        &json!({"operations": [["set", "w2", {"text": "hack"}]]}),
    );
    assert_eq!(response["head"]["errors"][0]["kind"], "MalformedPayload");
    assert!(session.registry().resolve(W2).unwrap().get("text").is_none());
}

#[test]
fn malformed_json_aborts_without_touching_state() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let before = session.preserved().clone();

    let err = session.service(b"{\"operations\": [").unwrap_err();
    assert_eq!(err.kind(), "BadRequest");
    let err = session
        .service(br#"{"operations": [["notify", "w2", {}]]}"#)
        .unwrap_err();
    assert_eq!(err.kind(), "BadRequest");

    assert_eq!(session.preserved(), &before);
    assert_eq!(session.request_count(), 1);
}

#[test]
fn unsupported_type_is_reported_and_others_render() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        ui.create("rwt.widgets.Tree", Some(shell))?;
        ui.create(LABEL, Some(shell))?;
        Ok(())
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    let errors = response["head"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], "UnsupportedType");
    assert_eq!(errors[0]["target"], "w2");
    let targets: Vec<_> = response["operations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|op| op[1].clone())
        .collect();
    assert_eq!(targets, vec![json!("w1"), json!("w3")]);
}

#[test]
fn unresolved_resource_skips_only_that_object() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let label = ui.create(LABEL, Some(shell))?;
        ui.set(label, "image", ImageRef::new("icons/missing.png", 1, 1))?;
        ui.set(shell, "visible", true)
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    assert_eq!(response["head"]["errors"][0]["kind"], "UnresolvedResource");
    assert_eq!(
        response["operations"],
        json!([["create", "w1", SHELL, {"visible": true}]])
    );
    assert!(!session.preserved().is_initialized(W2));
}

#[test]
fn failed_parent_defers_its_subtree() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let frame = ui.create(LABEL, None)?;
        ui.set(frame, "image", ImageRef::new("icons/missing.png", 1, 1))?;
        let label = ui.create(LABEL, Some(frame))?;
        ui.set(label, "text", "hi")?;
        let nested = ui.create(LABEL, Some(label))?;
        ui.set(nested, "text", "deeper")
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    let kinds: Vec<_> = response["head"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|note| (note["kind"].clone(), note["target"].clone()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (json!("UnresolvedResource"), json!("w1")),
            (json!("ParentNotRendered"), json!("w2")),
            (json!("ParentNotRendered"), json!("w3")),
        ]
    );
    assert_eq!(response["operations"], json!([]));

    let response = act(&mut session, |ui| {
        ui.set(W1, "image", ImageRef::new("icons/logo.png", 1, 1))
    });
    assert!(response["head"].get("errors").is_none());
    let operations = response["operations"].as_array().unwrap();
    let creates: Vec<_> = operations
        .iter()
        .map(|op| (op[0].clone(), op[1].clone(), op[3]["parent"].clone()))
        .collect();
    assert_eq!(
        creates,
        vec![
            (json!("create"), json!("w1"), Json::Null),
            (json!("create"), json!("w2"), json!("w1")),
            (json!("create"), json!("w3"), json!("w2")),
        ]
    );
    assert_eq!(operations[1][3]["text"], "hi");
}

#[test]
fn unsupported_parent_creates_no_children() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let tree = ui.create("rwt.widgets.Tree", None)?;
        let label = ui.create(LABEL, Some(tree))?;
        ui.set(label, "text", "hi")
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    let errors = response["head"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["kind"], "UnsupportedType");
    assert_eq!(errors[1]["kind"], "ParentNotRendered");
    assert_eq!(errors[1]["target"], "w2");
    assert_eq!(response["operations"], json!([]));
    assert!(!session.preserved().is_initialized(W2));
}

#[test]
fn image_encodes_resolved_url() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = act(&mut session, |ui| {
        ui.set(W2, "image", ImageRef::new("icons/logo.png", 100, 50))
    });
    assert_eq!(
        response["operations"],
        json!([["set", "w2", {"image": ["rwt-resources/logo.png", 100, 50]}]])
    );
}

#[test]
fn abandoned_request_rolls_back() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);

    {
        let mut cycle = session.begin();
        cycle.read_data(&ClientMessage::default()).unwrap();
        cycle.process_action().unwrap();
        cycle.ui().unwrap().set(W2, "text", "lost").unwrap();
        cycle.render().unwrap();
        assert_eq!(cycle.phase(), Phase::Render);
    }
    assert!(session.preserved().get(W2, "text").is_none());
    assert_eq!(session.request_count(), 1);

    let response = empty_request(&mut session);
    assert_eq!(response["operations"], json!([["set", "w2", {"text": "lost"}]]));
}

#[test]
fn phases_cannot_be_reentered() {
    let mut session = Session::new(label_app());
    let mut cycle = session.begin();
    assert!(matches!(
        cycle.render(),
        Err(SyncError::IllegalPhaseTransition {
            from: Phase::ReadData,
            to: Phase::Render
        })
    ));
    assert!(cycle.ui().is_err());
    cycle.read_data(&ClientMessage::default()).unwrap();
    assert!(cycle.read_data(&ClientMessage::default()).is_err());
    cycle.process_action().unwrap();
    cycle.render().unwrap();
    assert!(cycle.ui().is_err());
    assert!(cycle.process_action().is_err());
}

#[test]
fn destroy_emits_only_subtree_root() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let composite = ui.create(LABEL, Some(shell))?;
        ui.create(BUTTON, Some(composite))?;
        Ok(())
    });
    let mut session = Session::new(app);
    empty_request(&mut session);

    let response = act(&mut session, |ui| {
        assert!(ui.destroy(W2));
        Ok(())
    });
    assert_eq!(response["operations"], json!([["destroy", "w2"]]));
    assert!(session.preserved().get(ObjectId::new(3), "listen:Selection").is_none());
    assert!(!session.preserved().is_initialized(ObjectId::new(3)));
}

#[test]
fn never_rendered_object_is_destroyed_silently() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = act(&mut session, |ui| {
        let label = ui.create(LABEL, Some(W1))?;
        ui.set(label, "text", "short lived")?;
        ui.destroy(label);
        Ok(())
    });
    assert_eq!(response["operations"], json!([]));
}

#[test]
fn handlers_run_on_notify() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let button = ui.create(BUTTON, Some(shell))?;
        let label = ui.create(LABEL, Some(shell))?;
        ui.on(button, "Selection", move |ui, _event| {
            ui.set(label, "text", "clicked")
        })
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    assert!(response["operations"]
        .as_array()
        .unwrap()
        .contains(&json!(["listen", "w2", {"Selection": true}])));

    let response = request(
        &mut session,
        &json!({"operations": [["notify", "w2", "Selection", {}]]}),
    );
    assert_eq!(response["operations"], json!([["set", "w3", {"text": "clicked"}]]));
}

#[test]
fn handler_destroying_its_own_widget() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let button = ui.create(BUTTON, Some(shell))?;
        ui.on(button, "Selection", move |ui, event| {
            ui.destroy(event.target);
            Ok(())
        })
    });
    let mut session = Session::new(app);
    empty_request(&mut session);
    let response = request(
        &mut session,
        &json!({"operations": [
            ["notify", "w2", "Selection", {}],
            ["notify", "w2", "Selection", {}]
        ]}),
    );
    assert_eq!(response["operations"], json!([["destroy", "w2"]]));
}

#[test]
fn handler_removing_itself_stays_removed() {
    let runs = Arc::new(AtomicUsize::new(0));
    let removed = Arc::new(AtomicBool::new(false));
    let app = {
        let (runs, removed) = (Arc::clone(&runs), Arc::clone(&removed));
        app_with(EngineConfig::for_testing(), move |ui| {
            let shell = ui.create(SHELL, None)?;
            let button = ui.create(BUTTON, Some(shell))?;
            let (runs, removed) = (Arc::clone(&runs), Arc::clone(&removed));
            ui.on(button, "Selection", move |ui, event| {
                runs.fetch_add(1, Ordering::SeqCst);
                removed.store(ui.off(event.target, &event.name), Ordering::SeqCst);
                Ok(())
            })
        })
    };
    let mut session = Session::new(app);
    empty_request(&mut session);
    let notify = json!({"operations": [["notify", "w2", "Selection", {}]]});

    let response = request(&mut session, &notify);
    assert!(removed.load(Ordering::SeqCst));
    assert_eq!(
        response["operations"],
        json!([["listen", "w2", {"Selection": false}]])
    );
    request(&mut session, &notify);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn handler_replacing_itself_keeps_replacement() {
    let app = app_with(EngineConfig::for_testing(), |ui| {
        let shell = ui.create(SHELL, None)?;
        let button = ui.create(BUTTON, Some(shell))?;
        ui.on(button, "Selection", |ui, event| {
            ui.set(event.target, "text", "first")?;
            ui.on(event.target, "Selection", |ui, event| {
                ui.set(event.target, "text", "second")
            })
        })
    });
    let mut session = Session::new(app);
    empty_request(&mut session);
    let notify = json!({"operations": [["notify", "w2", "Selection", {}]]});

    let response = request(&mut session, &notify);
    assert_eq!(response["operations"], json!([["set", "w2", {"text": "first"}]]));
    let response = request(&mut session, &notify);
    assert_eq!(response["operations"], json!([["set", "w2", {"text": "second"}]]));
}

#[test]
fn server_calls_render_once() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let response = act(&mut session, |ui| {
        ui.set(W2, "text", "x")?;
        let mut properties = BTreeMap::new();
        properties.insert("delay".to_string(), Value::Int(10));
        ui.call(W2, "flash", properties)
    });
    assert_eq!(
        response["operations"],
        json!([
            ["set", "w2", {"text": "x"}],
            ["call", "w2", "flash", {"delay": 10}]
        ])
    );
    let response = empty_request(&mut session);
    assert_eq!(response["operations"], json!([]));
}

#[test]
fn server_call_to_undefined_method_is_rejected() {
    let mut session = Session::new(label_app());
    empty_request(&mut session);
    let mut cycle = session.begin();
    cycle.read_data(&ClientMessage::default()).unwrap();
    cycle.process_action().unwrap();
    let err = cycle
        .ui()
        .unwrap()
        .call(W2, "flush", BTreeMap::new())
        .unwrap_err();
    assert_eq!(err.kind(), "MalformedPayload");
    assert!(err.to_string().contains("flush"));
    cycle.render().unwrap();
    let response: Json = serde_json::from_slice(&cycle.write_response().unwrap()).unwrap();
    assert_eq!(response["operations"], json!([]));
}

#[test]
fn oversized_response_fails_and_rolls_back() {
    let config = EngineConfig {
        protocol: Limits {
            max_operations: 1,
            ..Limits::for_testing()
        },
        ..EngineConfig::for_testing()
    };
    let app = app_with(config, |ui| {
        let shell = ui.create(SHELL, None)?;
        ui.create(LABEL, Some(shell))?;
        Ok(())
    });
    let mut session = Session::new(app);
    let err = session.service(br#"{"operations":[]}"#).unwrap_err();
    assert_eq!(err.kind(), "Encode");
    assert!(session.preserved().is_empty());

    let response: Json = serde_json::from_slice(&session.handle(br#"{"operations":[]}"#)).unwrap();
    assert_eq!(response["head"]["error"]["kind"], "Encode");
}

#[test]
fn object_limit_is_reported() {
    let config = EngineConfig {
        session: engine::SessionLimits {
            max_objects: 1,
            ..engine::SessionLimits::for_testing()
        },
        ..EngineConfig::for_testing()
    };
    let app = app_with(config, |ui| {
        let shell = ui.create(SHELL, None)?;
        ui.create(LABEL, Some(shell))?;
        Ok(())
    });
    let mut session = Session::new(app);
    let response = empty_request(&mut session);
    assert_eq!(response["head"]["errors"][0]["kind"], "LimitsExceeded");
    assert_eq!(response["operations"].as_array().unwrap().len(), 1);
}
