//! A live map: transport, object registry and event dispatcher together.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use jlmap_builder::command::{MapCommand, ObjectCommand};
use jlmap_builder::layer::Layer;
use jlmap_builder::script::{map_subscription_script, render_layer};
use jlmap_core::config::{Config, check_map_binding, default_map_binding};
use jlmap_core::error::{JlMapError, Result};
use jlmap_core::event::SubscriptionSet;
use jlmap_core::listener::EventDispatcher;
use jlmap_core::types::{ObjectHandle, ObjectId};
use jlmap_transport::envelope::Envelope;
use jlmap_transport::executor::ScriptExecutor;
use jlmap_transport::transport::Transport;

use crate::registry::ObjectRegistry;

pub struct MapSession {
    transport: Transport,
    registry: ObjectRegistry,
    dispatcher: Arc<EventDispatcher>,
    map_binding: String,
}

impl MapSession {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            registry: ObjectRegistry::new(),
            dispatcher: Arc::new(EventDispatcher::new()),
            map_binding: default_map_binding(),
        }
    }

    /// Transport settings and map binding come from `config`.
    pub fn from_config(executor: Arc<dyn ScriptExecutor>, config: &Config) -> Result<Self> {
        Self::new(Transport::with_config(executor, config.transport()))
            .with_map_binding(config.map_binding())
    }

    /// Point every generated script at `binding`, which must be a dotted
    /// identifier path.
    pub fn with_map_binding(mut self, binding: impl Into<String>) -> Result<Self> {
        let binding = binding.into();
        check_map_binding(&binding)?;
        self.map_binding = binding;
        Ok(self)
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<EventDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn map_binding(&self) -> &str {
        &self.map_binding
    }

    /// Create a primitive and wire the listed actions to the event endpoint.
    ///
    /// The id is reserved before the script runs, so a concurrent create with
    /// the same id fails with `DuplicateObject`. If the script fails the
    /// reservation is released.
    pub async fn create(
        &self,
        id: &str,
        layer: &Layer,
        subscriptions: &SubscriptionSet,
    ) -> Result<ObjectHandle> {
        let id = ObjectId::new(id)?;
        let script = render_layer(&id, layer, subscriptions, &self.map_binding)?;
        let handle = ObjectHandle::new(id, layer.kind());

        self.registry.insert(handle.clone()).await?;
        if let Err(e) = self.transport.execute_void(Envelope::map(script)).await {
            self.registry.remove(handle.id.as_str()).await;
            return Err(e);
        }
        info!(id = %handle.id, kind = %handle.kind, listeners = subscriptions.len(), "Object created");
        Ok(handle)
    }

    /// Remove a primitive from the map and forget it.
    ///
    /// The handle is marked as removing before the script runs: of two
    /// concurrent removals only one reaches the engine (the other gets
    /// `UnknownObject`), and a create reusing the id fails with
    /// `DuplicateObject` until the engine has answered.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let handle = self.registry.begin_remove(id).await?;

        let result = match ObjectCommand::Remove.envelope(&handle) {
            Ok(envelope) => self.transport.execute_void(envelope).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(id, error = %e, "Remove failed, keeping object registered");
            self.registry.abort_remove(id).await;
            return Err(e);
        }

        self.registry.finish_remove(id).await;
        let dropped = self.dispatcher.unsubscribe_object(id).await;
        info!(id, dropped_listeners = dropped, "Object removed");
        Ok(())
    }

    /// Run a command on a created primitive.
    ///
    /// Returns the engine's completion value for getters and `Value::Null`
    /// otherwise. `Remove` goes through [`MapSession::remove`].
    pub async fn run(&self, id: &str, command: ObjectCommand) -> Result<Value> {
        if command == ObjectCommand::Remove {
            return self.remove(id).await.map(|()| Value::Null);
        }
        let handle = self.registry.resolve(id).await?;
        let envelope = command.envelope(&handle)?;
        debug!(id, method = command.name(), "Running object command");
        if command.returns_value() {
            self.transport.execute_raw(envelope).await
        } else {
            self.transport.execute_void(envelope).await.map(|()| Value::Null)
        }
    }

    /// Run a getter and decode its result.
    pub async fn query<T: DeserializeOwned>(&self, id: &str, command: ObjectCommand) -> Result<T> {
        let value = self.run(id, command).await?;
        serde_json::from_value(value.clone()).map_err(|e| JlMapError::conversion(value.to_string(), e))
    }

    pub async fn map_command(&self, command: &MapCommand) -> Result<Value> {
        let envelope = command.render(&self.map_binding)?;
        if command.returns_value() {
            self.transport.execute_raw(envelope).await
        } else {
            self.transport.execute_void(envelope).await.map(|()| Value::Null)
        }
    }

    pub async fn map_query<T: DeserializeOwned>(&self, command: &MapCommand) -> Result<T> {
        let envelope = command.render(&self.map_binding)?;
        self.transport.execute(envelope).await
    }

    /// Report map-level actions (zoom, move, ...) with origin `main_map`.
    pub async fn subscribe_map(&self, subscriptions: &SubscriptionSet) -> Result<()> {
        if subscriptions.is_empty() {
            return Ok(());
        }
        let script = map_subscription_script(subscriptions, &self.map_binding);
        self.transport.execute_void(Envelope::map(script)).await?;
        info!(listeners = subscriptions.len(), "Map listeners registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use jlmap_core::event::Action;
    use jlmap_core::types::{LatLng, ObjectKind};
    use jlmap_transport::executor::{MemoryExecutor, ScriptFault};

    use super::*;

    fn session(executor: MemoryExecutor) -> (MapSession, Arc<MemoryExecutor>) {
        let executor = Arc::new(executor);
        (MapSession::new(Transport::new(executor.clone())), executor)
    }

    #[tokio::test]
    async fn test_create_registers_and_executes() {
        let (session, executor) = session(MemoryExecutor::new());
        let handle = session
            .create(
                "circle",
                &Layer::circle(LatLng::new(10.2, 20.1), 13.0),
                &SubscriptionSet::from([Action::Move]),
            )
            .await
            .unwrap();
        assert_eq!(handle.kind, ObjectKind::Circle);
        assert!(session.registry().contains("circle").await);
        let scripts = executor.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].starts_with("var circle = L.circle("));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_and_duplicate_ids() {
        let (session, executor) = session(MemoryExecutor::new());
        let layer = Layer::marker(LatLng::new(0.0, 0.0));
        let subs = SubscriptionSet::new();

        let err = session.create("map", &layer, &subs).await.unwrap_err();
        assert!(matches!(err, JlMapError::InvalidObjectId { .. }));
        let err = session.create("a b", &layer, &subs).await.unwrap_err();
        assert!(matches!(err, JlMapError::InvalidObjectId { .. }));
        let err = session.create("main_map", &layer, &subs).await.unwrap_err();
        assert!(matches!(err, JlMapError::InvalidObjectId { .. }));

        session.create("m1", &layer, &subs).await.unwrap();
        let err = session.create("m1", &layer, &subs).await.unwrap_err();
        assert!(matches!(err, JlMapError::DuplicateObject(_)));
        assert_eq!(executor.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_releases_id() {
        let (session, _) = session(MemoryExecutor::with_responder(|_| {
            Err(ScriptFault::new("ReferenceError: L is not defined"))
        }));
        let err = session
            .create("m1", &Layer::marker(LatLng::new(0.0, 0.0)), &SubscriptionSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JlMapError::ScriptExecution { .. }));
        assert!(session.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unregisters_and_drops_listeners() {
        let (session, executor) = session(MemoryExecutor::new());
        session
            .create("m1", &Layer::marker(LatLng::new(0.0, 0.0)), &SubscriptionSet::new())
            .await
            .unwrap();
        let listener: Arc<dyn jlmap_core::listener::EventListener> =
            Arc::new(|_: &jlmap_core::event::Event| {});
        session.dispatcher().subscribe_object("m1", Some(listener), None).await;
        assert_eq!(session.dispatcher().len().await, 1);

        session.remove("m1").await.unwrap();
        assert!(session.registry().is_empty().await);
        assert!(session.dispatcher().is_empty().await);
        assert_eq!(executor.scripts().last().map(String::as_str), Some("this.m1.remove();"));

        let err = session.remove("m1").await.unwrap_err();
        assert!(matches!(err, JlMapError::UnknownObject(_)));
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_object() {
        let (session, _) = session(MemoryExecutor::with_responder(|script| {
            if script.ends_with(".remove();") {
                Err(ScriptFault::new("TypeError"))
            } else {
                Ok(Value::Null)
            }
        }));
        session
            .create("m1", &Layer::marker(LatLng::new(0.0, 0.0)), &SubscriptionSet::new())
            .await
            .unwrap();
        assert!(session.remove("m1").await.is_err());
        assert!(session.registry().contains("m1").await);
    }

    #[tokio::test]
    async fn test_run_getters_and_setters() {
        let (session, executor) = session(MemoryExecutor::with_responder(|script| {
            if script.contains("getLatLng") {
                Ok(json!({"lat": 3.0, "lng": 4.0}))
            } else {
                Ok(json!({"_leaflet_id": 7}))
            }
        }));
        session
            .create("c", &Layer::circle(LatLng::new(0.0, 0.0), 5.0), &SubscriptionSet::new())
            .await
            .unwrap();

        let position: LatLng = session.query("c", ObjectCommand::GetLatLng).await.unwrap();
        assert_eq!(position, LatLng::new(3.0, 4.0));

        let value = session.run("c", ObjectCommand::SetRadius(9.0)).await.unwrap();
        assert_eq!(value, Value::Null);
        assert_eq!(
            executor.scripts().last().map(String::as_str),
            Some("this.c.setRadius(9.000000);")
        );

        let err = session.run("c", ObjectCommand::SetOpacity(0.5)).await.unwrap_err();
        assert!(matches!(err, JlMapError::UnsupportedMethod { .. }));
        let err = session.run("nope", ObjectCommand::GetLatLng).await.unwrap_err();
        assert!(matches!(err, JlMapError::UnknownObject(_)));
    }

    #[tokio::test]
    async fn test_map_commands_use_binding() {
        let (session, executor) = session(MemoryExecutor::with_responder(|_| Ok(json!(11))));
        let session = session.with_map_binding("window.lmap").unwrap();
        let zoom: f64 = session.map_query(&MapCommand::GetZoom).await.unwrap();
        assert_eq!(zoom, 11.0);
        session.map_command(&MapCommand::ZoomIn).await.unwrap();
        assert_eq!(
            executor.scripts(),
            vec!["window.lmap.getZoom();", "window.lmap.zoomIn();"]
        );
    }

    #[tokio::test]
    async fn test_subscribe_map() {
        let (session, executor) = session(MemoryExecutor::new());
        session.subscribe_map(&SubscriptionSet::new()).await.unwrap();
        assert!(executor.is_empty());
        session
            .subscribe_map(&SubscriptionSet::from([Action::ZoomEnd]))
            .await
            .unwrap();
        assert!(executor.scripts()[0].contains("this.map.on('zoomend'"));
    }

    #[tokio::test]
    async fn test_from_config() {
        let config: Config = serde_json::from_str(r#"{"map": {"binding": "app.map"}}"#).unwrap();
        let session = MapSession::from_config(Arc::new(MemoryExecutor::new()), &config).unwrap();
        assert_eq!(session.map_binding(), "app.map");
    }

    #[tokio::test]
    async fn test_bad_map_binding_is_rejected() {
        let config: Config =
            serde_json::from_str(r#"{"map": {"binding": "this.map); alert(1); (x"}}"#).unwrap();
        let executor = Arc::new(MemoryExecutor::new());
        let err = MapSession::from_config(executor.clone(), &config)
            .err()
            .unwrap();
        assert!(matches!(err, JlMapError::Config(_)));

        let (session, _) = session(MemoryExecutor::new());
        let err = session.with_map_binding("this['map']").err().unwrap();
        assert!(matches!(err, JlMapError::Config(_)));
        assert!(executor.is_empty());
    }
}
