// ── Payload assembly ──
//
// Two shapes per cycle: the raw `Payload` (nulls preserved, returned to
// callers and published on the watch channel) and the dispatch-facing
// `DisplayFrame` (defaults applied, exact wire keys the display firmware
// expects). Assembly is pure and never fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::config::CUSTOM_SLOTS;
use crate::resolve::{SampledValues, SlotValue};
use crate::rotation::PagePosition;

/// The raw result of one update cycle.
///
/// Numeric fields keep `None` for missing sources so inspection callers
/// can distinguish "no data" from an actual zero reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    #[serde(flatten)]
    pub values: SampledValues,
    pub page: PagePosition,
    pub show_kw: bool,
    pub sampled_at: DateTime<Utc>,
}

/// Build the cycle's payload. Pure; all inputs already defaulted.
pub fn assemble(
    values: SampledValues,
    page: PagePosition,
    show_kw: bool,
    now: DateTime<Utc>,
) -> Payload {
    Payload {
        values,
        page,
        show_kw,
        sampled_at: now,
    }
}

// ── Dispatch-facing frame ───────────────────────────────────────────

/// The frame pushed to the display service.
///
/// Wire contract: missing numerics become `0.0`, empty slot labels and
/// values become a single space (the firmware's text renderer rejects
/// empty strings). Keys follow the firmware's service schema:
/// `solar`, `grid`, ... `c1_n`/`c1_v` through `c12_n`/`c12_v`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub solar: f64,
    pub grid: f64,
    pub house: f64,
    pub bat_w: f64,
    pub bat_soc: f64,
    pub val_yield: f64,
    pub val_yield_month: f64,
    pub val_yield_year: f64,
    pub val_yield_total: f64,
    pub grid_in: f64,
    pub grid_out: f64,
    pub page_num: u8,
    pub page_idx: u8,
    pub page_total: u8,
    pub show_kw: bool,
    pub slots: Vec<SlotValue>,
}

fn space_if_empty(text: &str) -> String {
    if text.is_empty() {
        " ".to_owned()
    } else {
        text.to_owned()
    }
}

impl From<&Payload> for DisplayFrame {
    fn from(payload: &Payload) -> Self {
        let v = &payload.values;
        let slots = (0..CUSTOM_SLOTS)
            .map(|i| {
                let slot = v.slots.get(i);
                SlotValue {
                    name: space_if_empty(slot.map(|s| s.name.as_str()).unwrap_or_default()),
                    value: space_if_empty(slot.map(|s| s.value.as_str()).unwrap_or_default()),
                }
            })
            .collect();

        Self {
            solar: v.solar_w.unwrap_or_default(),
            grid: v.grid_w.unwrap_or_default(),
            house: v.house_w.unwrap_or_default(),
            bat_w: v.battery_w.unwrap_or_default(),
            bat_soc: v.battery_soc.unwrap_or_default(),
            val_yield: v.yield_today_kwh.unwrap_or_default(),
            val_yield_month: v.yield_month_kwh.unwrap_or_default(),
            val_yield_year: v.yield_year_kwh.unwrap_or_default(),
            val_yield_total: v.yield_total_kwh.unwrap_or_default(),
            grid_in: v.grid_import_kwh.unwrap_or_default(),
            grid_out: v.grid_export_kwh.unwrap_or_default(),
            page_num: payload.page.page,
            page_idx: payload.page.index,
            page_total: payload.page.count,
            show_kw: payload.show_kw,
            slots,
        }
    }
}

// Hand-written so the twelve slots flatten into `cN_n`/`cN_v` keys.
impl Serialize for DisplayFrame {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(15 + 2 * CUSTOM_SLOTS))?;
        map.serialize_entry("solar", &self.solar)?;
        map.serialize_entry("grid", &self.grid)?;
        map.serialize_entry("house", &self.house)?;
        map.serialize_entry("bat_w", &self.bat_w)?;
        map.serialize_entry("bat_soc", &self.bat_soc)?;
        map.serialize_entry("val_yield", &self.val_yield)?;
        map.serialize_entry("val_yield_month", &self.val_yield_month)?;
        map.serialize_entry("val_yield_year", &self.val_yield_year)?;
        map.serialize_entry("val_yield_total", &self.val_yield_total)?;
        map.serialize_entry("grid_in", &self.grid_in)?;
        map.serialize_entry("grid_out", &self.grid_out)?;
        map.serialize_entry("page_num", &self.page_num)?;
        map.serialize_entry("page_idx", &self.page_idx)?;
        map.serialize_entry("page_total", &self.page_total)?;
        map.serialize_entry("show_kw", &self.show_kw)?;
        for (i, slot) in self.slots.iter().enumerate() {
            map.serialize_entry(&format!("c{}_n", i + 1), &slot.name)?;
            map.serialize_entry(&format!("c{}_v", i + 1), &slot.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn position() -> PagePosition {
        PagePosition {
            page: 3,
            index: 2,
            count: 2,
        }
    }

    fn sampled() -> SampledValues {
        SampledValues {
            solar_w: Some(1250.4),
            grid_w: None,
            battery_soc: Some(87.0),
            slots: vec![
                SlotValue {
                    name: "Pool".into(),
                    value: "21.5 °C".into(),
                },
                SlotValue {
                    name: String::new(),
                    value: String::new(),
                },
            ],
            ..SampledValues::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn raw_payload_preserves_nulls() {
        let payload = assemble(sampled(), position(), false, now());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["solar_w"], serde_json::json!(1250.4));
        assert_eq!(json["grid_w"], serde_json::Value::Null);
        assert_eq!(json["page"]["page"], serde_json::json!(3));
        assert_eq!(json["page"]["index"], serde_json::json!(2));
        assert_eq!(json["page"]["count"], serde_json::json!(2));
    }

    #[test]
    fn frame_defaults_nulls_to_zero() {
        let payload = assemble(sampled(), position(), true, now());
        let frame = DisplayFrame::from(&payload);

        assert_eq!(frame.solar, 1250.4);
        assert_eq!(frame.grid, 0.0);
        assert_eq!(frame.house, 0.0);
        assert_eq!(frame.bat_soc, 87.0);
        assert!(frame.show_kw);
    }

    #[test]
    fn frame_pads_missing_slots_with_spaces() {
        let payload = assemble(sampled(), position(), false, now());
        let frame = DisplayFrame::from(&payload);

        assert_eq!(frame.slots.len(), CUSTOM_SLOTS);
        assert_eq!(frame.slots[0].name, "Pool");
        assert_eq!(frame.slots[0].value, "21.5 °C");
        // Empty strings become a single space, for the firmware renderer.
        assert_eq!(frame.slots[1].name, " ");
        assert_eq!(frame.slots[1].value, " ");
        // Slots beyond the sampled list are padded too.
        assert_eq!(frame.slots[11].name, " ");
        assert_eq!(frame.slots[11].value, " ");
    }

    #[test]
    fn frame_serializes_with_wire_keys() {
        let payload = assemble(sampled(), position(), false, now());
        let frame = DisplayFrame::from(&payload);
        let json = serde_json::to_value(&frame).unwrap();

        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 15 + 2 * CUSTOM_SLOTS);
        assert_eq!(json["solar"], serde_json::json!(1250.4));
        assert_eq!(json["grid"], serde_json::json!(0.0));
        assert_eq!(json["page_num"], serde_json::json!(3));
        assert_eq!(json["page_idx"], serde_json::json!(2));
        assert_eq!(json["page_total"], serde_json::json!(2));
        assert_eq!(json["c1_n"], serde_json::json!("Pool"));
        assert_eq!(json["c1_v"], serde_json::json!("21.5 °C"));
        assert_eq!(json["c12_n"], serde_json::json!(" "));
        assert_eq!(json["c12_v"], serde_json::json!(" "));
    }
}
