//! Row Actions for Table Charts
//!
//! This crate ties the visibility engine to a rendered table cell: given the
//! configured actions, one row, its selection state and an attribute source, it
//! lists the actions to offer and turns a click into exactly one payload for
//! the host.
//!
//! # Features
//!
//! - **Selection gates** - `all`, `selected`, `unselected`
//! - **Column and RLS conditions** - numeric-aware comparison, `IN` lists, null checks
//! - **Grouped RLS conditions** - per-group and cross-group AND/OR
//! - **Payload trimming** - `valueColumns` allow-lists and RLS match annotation
//!
//! RLS attributes come from client-controlled state and only shape what is
//! offered; they do not enforce access.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use row_actions_common as common;
pub use row_actions_rules as rules;

use serde::Serialize;
use tracing::debug;

use row_actions_common::types::{ActionPayload, ChartId, Row, RowId};
use row_actions_rules::{
    ActionConfig, ActionFilter, ActionIcon, ActionStyle, AttributeSource, PayloadBuilder,
    VisibleAction,
};

/// Receives the payload of an invoked action
pub trait ActionSink {
    fn on_action(&mut self, payload: ActionPayload);
}

impl<F: FnMut(ActionPayload)> ActionSink for F {
    fn on_action(&mut self, payload: ActionPayload) {
        self(payload);
    }
}

/// What the host needs to draw one menu item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    /// The action key, or the entry's position when the key is empty
    pub key: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<ActionIcon>,
    pub style: ActionStyle,
}

impl MenuEntry {
    pub fn from_visible(index: usize, action: &VisibleAction<'_>) -> Self {
        let config = action.config;
        let key = if config.key.is_empty() {
            index.to_string()
        } else {
            config.key.clone()
        };

        Self {
            key,
            label: config.label.clone(),
            tooltip: config.tooltip.clone(),
            icon: config.icon,
            style: config.style.unwrap_or_default(),
        }
    }
}

/// The action cell of one table row
pub struct ActionCell<'a, S: AttributeSource + ?Sized> {
    row_id: RowId,
    actions: &'a [ActionConfig],
    row: &'a Row,
    source: &'a S,
    chart_id: Option<ChartId>,
    id_column: Option<String>,
    is_selected: bool,
}

impl<'a, S: AttributeSource + ?Sized> ActionCell<'a, S> {
    pub fn new(row_id: RowId, actions: &'a [ActionConfig], row: &'a Row, source: &'a S) -> Self {
        Self {
            row_id,
            actions,
            row,
            source,
            chart_id: None,
            id_column: None,
            is_selected: false,
        }
    }

    #[must_use]
    pub fn selected(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    #[must_use]
    pub fn with_chart_id(mut self, chart_id: ChartId) -> Self {
        self.chart_id = Some(chart_id);
        self
    }

    /// Name of the row's id column; kept for the host, not used for visibility
    #[must_use]
    pub fn with_id_column(mut self, id_column: &str) -> Self {
        self.id_column = Some(id_column.to_string());
        self
    }

    pub fn row_id(&self) -> &RowId {
        &self.row_id
    }

    pub fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    /// Actions offered for this row, in configuration order
    pub fn visible_actions(&self) -> Vec<VisibleAction<'a>> {
        ActionFilter::new(self.source).visible_actions(self.actions, self.row, self.is_selected)
    }

    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        self.visible_actions()
            .iter()
            .enumerate()
            .map(|(index, action)| MenuEntry::from_visible(index, action))
            .collect()
    }

    /// Invoke the first visible action with `key`, handing its payload to `sink`
    ///
    /// Returns the emitted payload, or `None` (emitting nothing) when no visible
    /// action has that key.
    pub fn click(&self, key: &str, sink: &mut dyn ActionSink) -> Option<ActionPayload> {
        let visible = self.visible_actions();
        let Some(action) = visible.iter().find(|action| action.config.key == key) else {
            debug!(row_id = %self.row_id, key, "click on an action that is not visible");
            return None;
        };

        let payload = PayloadBuilder::new(self.chart_id.clone()).build(
            action.config,
            self.row,
            &action.matching_rls_conditions,
        );
        sink.on_action(payload.clone());
        Some(payload)
    }
}
