//! The narrow view of a host node that classification, location and write-back work against.

use crate::reference::AssetRef;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub type NodeId = i64;

/// Change hook a host attaches to a widget.
pub type WidgetCallback = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WidgetOptions {
    /// Enumerable choices for combo widgets. Grows as new assets are written back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct Widget {
    pub name: String,
    pub value: Value,
    pub options: Option<WidgetOptions>,
    callback: Option<WidgetCallback>,
}

impl Widget {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options: None,
            callback: None,
        }
    }

    pub fn with_choices(mut self, values: Vec<String>) -> Self {
        self.options = Some(WidgetOptions {
            values: Some(values),
        });
        self
    }

    pub fn with_options(mut self, options: Option<WidgetOptions>) -> Self {
        self.options = options;
        self
    }

    pub fn on_change(mut self, callback: WidgetCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    pub fn choices(&self) -> Option<&[String]> {
        self.options.as_ref()?.values.as_deref()
    }

    /// Appends `value` to the choice list if the widget has one and lacks it.
    pub fn offer_choice(&mut self, value: &str) -> bool {
        match self.options.as_mut().and_then(|o| o.values.as_mut()) {
            Some(values) if !values.iter().any(|v| v == value) => {
                values.push(value.to_string());
                true
            }
            _ => false,
        }
    }

    /// Sets the value and fires the change hook with it.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.value = value.into();
        if let Some(callback) = &self.callback {
            callback(&self.value);
        }
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("options", &self.options)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Decoded preview bitmap cached on a node.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub image: Arc<RgbaImage>,
}

impl Thumbnail {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Adapter over a host-owned node. One implementation per host shape; see `graph::GraphNode`.
pub trait HostNode: Send {
    fn id(&self) -> NodeId;
    fn type_tag(&self) -> Option<&str>;
    fn widgets(&self) -> &[Widget];
    fn widgets_mut(&mut self) -> &mut [Widget];
    fn images(&self) -> &[AssetRef];
    fn set_images(&mut self, images: Vec<AssetRef>);
    fn property(&self, key: &str) -> Option<&Value>;
    fn set_thumbnails(&mut self, thumbnails: Vec<Thumbnail>);

    fn widget_named(&self, names: &[&str]) -> Option<&Widget> {
        self.widgets().iter().find(|w| names.contains(&w.name.as_str()))
    }

    fn widget_named_mut(&mut self, names: &[&str]) -> Option<&mut Widget> {
        self.widgets_mut()
            .iter_mut()
            .find(|w| names.contains(&w.name.as_str()))
    }
}
