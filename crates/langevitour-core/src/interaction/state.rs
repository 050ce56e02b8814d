//! Session snapshot and partial updates
//!
//! [`SessionState`] is everything needed to restore a view: control values
//! (slider positions, not physical values), label placement, the current
//! projection and the selection/filter masks in original row order.
//! [`StateUpdate`] is the same with every field optional; applying it
//! changes only the fields that are present.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Guide name meaning "no guide"
pub const NO_GUIDE: &str = "none";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub playing: bool,
    pub axes_on: bool,
    pub damping: f64,
    pub heat: f64,
    pub heat_on: bool,
    pub guide_type: String,
    pub guide: f64,
    pub label_attraction_on: bool,
    pub label_attraction: f64,
    /// Names of deactivated labels
    pub label_inactive: Vec<String>,
    /// Positions of labels inside the plot; unlisted labels are parked
    pub label_pos: BTreeMap<String, [f64; 2]>,
    pub projection: Vec<Vec<f64>>,
    pub selection: Option<Vec<bool>>,
    pub filter: Option<Vec<bool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_type: Option<String>,
    /// Older name for `guideType`
    #[serde(default, skip_serializing)]
    pub point_repulsion_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide: Option<f64>,
    /// Older name for `guide`
    #[serde(default, skip_serializing)]
    pub point_repulsion: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_attraction_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_attraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_inactive: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_pos: Option<BTreeMap<String, [f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<Vec<f64>>>,
    /// `Some(None)` clears the selection; `None` leaves it alone
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub selection: Option<Option<Vec<bool>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Option<Vec<bool>>>,
}

impl StateUpdate {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `guideType`, falling back to its older name.
    pub fn guide_type(&self) -> Option<&str> {
        self.guide_type
            .as_deref()
            .or(self.point_repulsion_type.as_deref())
    }

    /// `guide`, falling back to its older name.
    pub fn guide(&self) -> Option<f64> {
        self.guide.or(self.point_repulsion)
    }
}

impl From<SessionState> for StateUpdate {
    fn from(state: SessionState) -> Self {
        Self {
            playing: Some(state.playing),
            axes_on: Some(state.axes_on),
            damping: Some(state.damping),
            heat: Some(state.heat),
            heat_on: Some(state.heat_on),
            guide_type: Some(state.guide_type),
            point_repulsion_type: None,
            guide: Some(state.guide),
            point_repulsion: None,
            label_attraction_on: Some(state.label_attraction_on),
            label_attraction: Some(state.label_attraction),
            label_inactive: Some(state.label_inactive),
            label_pos: Some(state.label_pos),
            projection: Some(state.projection),
            selection: Some(state.selection),
            filter: Some(state.filter),
        }
    }
}

/// A field that is present, possibly as `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_absent_versus_null() {
        let update = StateUpdate::from_json(r#"{"selection": null}"#).unwrap();
        assert_eq!(update.selection, Some(None));
        assert_eq!(update.filter, None);

        let update = StateUpdate::from_json(r#"{"filter": [true, false]}"#).unwrap();
        assert_eq!(update.filter, Some(Some(vec![true, false])));
        assert_eq!(update.selection, None);
    }

    #[test]
    fn test_legacy_guide_keys() {
        let update =
            StateUpdate::from_json(r#"{"pointRepulsionType": "pca", "pointRepulsion": 1.5}"#)
                .unwrap();
        assert_eq!(update.guide_type(), Some("pca"));
        assert_eq!(update.guide(), Some(1.5));

        let update = StateUpdate::from_json(
            r#"{"pointRepulsionType": "pca", "guideType": "local", "guide": 0.5, "pointRepulsion": 2}"#,
        )
        .unwrap();
        assert_eq!(update.guide_type(), Some("local"));
        assert_eq!(update.guide(), Some(0.5));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let update = StateUpdate::from_json(r#"{"heatOn": false, "zoom": 3}"#).unwrap();
        assert_eq!(update.heat_on, Some(false));
    }

    #[test]
    fn test_full_snapshot_serializes_every_key() {
        let state = SessionState {
            playing: true,
            axes_on: true,
            damping: 0.0,
            heat: 0.0,
            heat_on: true,
            guide_type: NO_GUIDE.into(),
            guide: 0.0,
            label_attraction_on: true,
            label_attraction: 0.0,
            label_inactive: vec![],
            label_pos: BTreeMap::new(),
            projection: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            selection: None,
            filter: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        for key in [
            "playing",
            "axesOn",
            "damping",
            "heat",
            "heatOn",
            "guideType",
            "guide",
            "labelAttractionOn",
            "labelAttraction",
            "labelInactive",
            "labelPos",
            "projection",
            "selection",
            "filter",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }

        let update: StateUpdate = state.into();
        let text = serde_json::to_string(&update).unwrap();
        let back = StateUpdate::from_json(&text).unwrap();
        assert_eq!(back, update);
    }
}
