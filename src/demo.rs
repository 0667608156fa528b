//! In-memory widget service used by `serve` and the integration tests.
//!
//! Backs the operations in `demos/widgets.json`:
//! `widgets::list`, `widgets::get`, `widgets::create` and `widgets::delete`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::binding::Arguments;
use crate::descriptor::{parse_document, ApiDocument, SourceError};
use crate::dispatch::Fault;
use crate::services::{HandlerResult, ServiceRegistry};

/// The bundled API document.
pub const WIDGETS_DOCUMENT: &str = include_str!("../demos/widgets.json");

pub const SERVICE: &str = "widgets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for `createWidget`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWidget {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
struct Inventory {
    next_id: i64,
    widgets: BTreeMap<i64, Widget>,
}

/// Shared widget store.
#[derive(Debug, Clone, Default)]
pub struct WidgetStore {
    inner: Arc<Mutex<Inventory>>,
}

impl WidgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a few sample widgets.
    pub fn seeded() -> Self {
        let store = Self::new();
        for (name, tags) in [
            ("sprocket", vec!["metal", "round"]),
            ("gizmo", vec!["plastic"]),
            ("flange", vec!["metal"]),
        ] {
            if let Err(e) = store.create(NewWidget {
                name: name.to_string(),
                tags: tags.into_iter().map(str::to_string).collect(),
            }) {
                tracing::warn!(widget = name, error = %e, "Failed to seed widget");
            }
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inventory>, Fault> {
        self.inner
            .lock()
            .map_err(|_| Fault::handler("Widget store is unavailable"))
    }

    /// Widgets carrying every tag in `tags`, at most `limit` of them.
    pub fn list(&self, tags: &[String], limit: Option<i64>) -> Result<Vec<Widget>, Fault> {
        if let Some(limit) = limit.filter(|l| *l < 0) {
            return Err(Fault::bad_request(format!("limit must not be negative, got {limit}")));
        }
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);

        Ok(self
            .lock()?
            .widgets
            .values()
            .filter(|w| tags.iter().all(|t| w.tags.contains(t)))
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn get(&self, id: i64) -> Result<Widget, Fault> {
        self.lock()?
            .widgets
            .get(&id)
            .cloned()
            .ok_or_else(|| Fault::not_found(format!("Widget {id} not found")))
    }

    pub fn create(&self, new: NewWidget) -> Result<Widget, Fault> {
        let mut inventory = self.lock()?;
        if inventory.widgets.values().any(|w| w.name == new.name) {
            return Err(Fault::conflict(format!(
                "A widget named \"{}\" already exists",
                new.name
            )));
        }
        inventory.next_id += 1;
        let widget = Widget {
            id: inventory.next_id,
            name: new.name,
            tags: new.tags,
        };
        inventory.widgets.insert(widget.id, widget.clone());
        Ok(widget)
    }

    pub fn delete(&self, id: i64) -> Result<(), Fault> {
        self.lock()?
            .widgets
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Fault::not_found(format!("Widget {id} not found")))
    }

    /// Register the widget operations, body type and error types.
    pub fn register(&self, services: &mut ServiceRegistry, api: &str) {
        services.register_standard_errors(api);
        services.register_type::<NewWidget>("NewWidget");

        let store = self.clone();
        services.register_handler(SERVICE, "list", move |args: Arguments| {
            to_value(store.list(args.list(0), args.integer(1))?)
        });

        let store = self.clone();
        services.register_handler(SERVICE, "get", move |args: Arguments| {
            to_value(store.get(args.require_integer(0)?)?)
        });

        let store = self.clone();
        services.register_handler(SERVICE, "create", move |mut args: Arguments| {
            let new: NewWidget = args.take_object(0)?;
            to_value(store.create(new)?)
        });

        let store = self.clone();
        services.register_handler(SERVICE, "delete", move |args: Arguments| {
            store.delete(args.require_integer(0)?)?;
            Ok(None)
        });
    }
}

fn to_value<T: Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| Fault::Serialization(e.to_string()))
}

/// Parse the bundled document.
pub fn widgets_document() -> Result<ApiDocument, SourceError> {
    parse_document(WIDGETS_DOCUMENT, false)
}
