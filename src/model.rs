//! Payloads sent by the Run & Bun companion app
//!
//! Field names follow the companion's camelCase JSON. Every request body is
//! checked with [`validate_update_request`] (or its siblings) before it
//! reaches the renderer, so the rest of the crate works with typed data.

use crate::catalog::Lang;
use crate::error::{Error, Result};
use crate::geometry::MAX_RUN_SLOT;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where the companion publishes new client releases.
pub const RELEASES_URL: &str = "https://github.com/Sykless/RunAndBunDisplay/releases";

/// Body fields that only pre-locator clients send.
const OUTDATED_KEYS: [&str; 2] = ["newRuns", "numberOfRuns"];

/// Fields `/updateRun` refuses to work without, as JSON pointers.
const MANDATORY_KEYS: [(&str, &str); 5] = [
    ("keys.spreadsheetId", "/keys/spreadsheetId"),
    ("keys.sheetId", "/keys/sheetId"),
    ("updatedData.runs", "/updatedData/runs"),
    ("fullData.runs", "/fullData/runs"),
    ("lang", "/lang"),
];

/// Target document and sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Keys {
    pub spreadsheet_id: String,
    #[serde(deserialize_with = "sheet_id_from_any")]
    pub sheet_id: i64,
}

/// Text written verbatim into a cell. The companion sends counters as
/// numbers and dates as strings; both end up as cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawText")]
pub struct CellText(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null(()),
}

impl From<RawText> for CellText {
    fn from(raw: RawText) -> Self {
        CellText(match raw {
            RawText::Text(s) => s,
            RawText::Int(i) => i.to_string(),
            RawText::Float(f) => f.to_string(),
            RawText::Bool(b) => b.to_string(),
            RawText::Null(()) => String::new(),
        })
    }
}

impl CellText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellText {
    fn from(s: &str) -> Self {
        CellText(s.to_string())
    }
}

/// Personal-best trainer: the furthest trainer reached across attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBest {
    #[serde(default)]
    pub trainer_name: String,
    #[serde(default)]
    pub trainer_sprite: String,
    /// Species ids, up to six.
    #[serde(default)]
    pub trainer_team: Vec<u32>,
}

/// Complete run attributes, used when a run card is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    #[serde(default)]
    pub run_start: CellText,
    #[serde(default)]
    pub run_end: CellText,
    #[serde(default)]
    pub won_battles: CellText,
    #[serde(default)]
    pub dead_pokemon: CellText,
    #[serde(default)]
    pub gym_badges: u8,
    #[serde(default)]
    pub personal_best: Option<PersonalBest>,
}

/// Sparse run attributes: only the fields that changed since the last sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialRunData {
    pub run_start: Option<CellText>,
    pub run_end: Option<CellText>,
    pub won_battles: Option<CellText>,
    pub dead_pokemon: Option<CellText>,
    pub gym_badges: Option<u8>,
    pub personal_best: Option<PersonalBest>,
}

impl PartialRunData {
    pub fn is_empty(&self) -> bool {
        self.run_start.is_none()
            && self.run_end.is_none()
            && self.won_battles.is_none()
            && self.dead_pokemon.is_none()
            && self.gym_badges.is_none()
            && self.personal_best.is_none()
    }
}

/// A Pokémon caught in one zone of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pokemon {
    pub pokedex_id: u32,
    pub pokemon_name: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub ability: String,
    #[serde(default)]
    pub level: u32,
    /// Personality value, unique per caught Pokémon.
    #[serde(default)]
    pub pid: CellText,
    #[serde(default)]
    pub moves: Vec<String>,
    #[serde(default)]
    pub nature: String,
    #[serde(rename = "IVs", default)]
    pub ivs: Vec<CellText>,
}

fn default_alive() -> bool {
    true
}

/// Zone name to encounter. `null` means the zone has no capture.
pub type PokemonData = BTreeMap<String, Option<Pokemon>>;

/// Everything known about one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunEntry {
    #[serde(default)]
    pub run_data: RunData,
    #[serde(default)]
    pub pokemon_data: PokemonData,
}

/// What changed in one run since the last sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunUpdate {
    #[serde(default)]
    pub run_data: PartialRunData,
    #[serde(default)]
    pub pokemon_data: PokemonData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Runs<T> {
    pub runs: BTreeMap<String, T>,
}

/// `POST /updateRun` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunRequest {
    pub keys: Keys,
    pub updated_data: Runs<RunUpdate>,
    pub full_data: Runs<RunEntry>,
    pub lang: Lang,
}

/// `POST /initRun` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitRunRequest {
    pub keys: Keys,
    pub run_id: String,
    #[serde(default)]
    pub run_data: RunData,
    #[serde(default)]
    pub pokemon_data: PokemonData,
    #[serde(default)]
    pub lang: Lang,
}

/// `POST /updatePokemonCards` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePokemonCardsRequest {
    pub keys: Keys,
    /// Block to patch; the newest run when absent.
    #[serde(default)]
    pub run_slot: Option<usize>,
    pub pokemon_data: PokemonData,
    #[serde(default)]
    pub lang: Lang,
}

fn sheet_id_from_any<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("sheetId must be an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("sheetId is not a number: {}", s))),
        other => Err(serde::de::Error::custom(format!(
            "sheetId must be a number, got {}",
            other
        ))),
    }
}

/// A value the companion did not really send: absent, `null`, `""` or `{}`.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// True when the body comes from a client older than slot discovery.
pub fn contains_outdated_keys(body: &Value) -> bool {
    OUTDATED_KEYS.iter().any(|key| {
        body.get(key).is_some()
            || body
                .get("updatedData")
                .and_then(|u| u.get(key))
                .is_some()
    })
}

/// Name of the first mandatory key missing from the body.
pub fn missing_mandatory_key(body: &Value) -> Option<&'static str> {
    MANDATORY_KEYS
        .iter()
        .find(|(_, pointer)| is_blank(body.pointer(pointer)))
        .map(|(name, _)| *name)
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(Error::Validation("No data received".to_string()));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::Validation(format!("Invalid JSON: {}", e)))?;
    if is_blank(Some(&value)) {
        return Err(Error::Validation("No data received".to_string()));
    }
    Ok(value)
}

fn typed<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Validation(format!("Invalid payload: {}", e)))
}

/// Check an `/updateRun` body and convert it to typed data.
pub fn validate_update_request(body: &str) -> Result<UpdateRunRequest> {
    let value = parse_body(body)?;

    if contains_outdated_keys(&value) {
        return Err(Error::Validation(format!(
            "Outdated version : please download the latest RunAndBunDisplay version {}",
            RELEASES_URL
        )));
    }

    if let Some(key) = missing_mandatory_key(&value) {
        return Err(Error::Validation(format!(
            "Missing required fields : {}",
            key
        )));
    }

    typed(value)
}

/// Check an `/initRun` body.
pub fn validate_init_request(body: &str) -> Result<InitRunRequest> {
    typed(parse_body(body)?)
}

/// Check an `/updatePokemonCards` body. `runSlot` must name a block that
/// fits in a sheet.
pub fn validate_pokemon_cards_request(body: &str) -> Result<UpdatePokemonCardsRequest> {
    let request: UpdatePokemonCardsRequest = typed(parse_body(body)?)?;
    if let Some(slot) = request.run_slot.filter(|slot| *slot > MAX_RUN_SLOT) {
        return Err(Error::Validation(format!(
            "Invalid runSlot : {} (max {})",
            slot, MAX_RUN_SLOT
        )));
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_body() -> Value {
        json!({
            "keys": {"spreadsheetId": "sheet-abc", "sheetId": 0},
            "updatedData": {"runs": {"run-1": {"runData": {"wonBattles": 10}}}},
            "fullData": {"runs": {"run-1": {"runData": {"runStart": "2025-01-01"}}}},
            "lang": "EN"
        })
    }

    #[test]
    fn test_valid_body_parses() {
        let req = validate_update_request(&minimal_body().to_string()).unwrap();
        assert_eq!(req.keys.spreadsheet_id, "sheet-abc");
        assert_eq!(req.keys.sheet_id, 0);
        let update = &req.updated_data.runs["run-1"];
        assert_eq!(update.run_data.won_battles, Some(CellText("10".into())));
        assert!(update.run_data.gym_badges.is_none());
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = validate_update_request("").unwrap_err();
        assert_eq!(err.to_string(), "No data received");
        assert!(validate_update_request("{}").is_err());
    }

    #[test]
    fn test_missing_key_named_in_message() {
        let mut body = minimal_body();
        body["keys"].as_object_mut().unwrap().remove("spreadsheetId");
        let err = validate_update_request(&body.to_string()).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("keys.spreadsheetId"));

        let mut body = minimal_body();
        body.as_object_mut().unwrap().remove("lang");
        let err = validate_update_request(&body.to_string()).unwrap_err();
        assert!(err.to_string().contains("lang"));
    }

    #[test]
    fn test_sheet_id_zero_is_not_missing() {
        assert_eq!(missing_mandatory_key(&minimal_body()), None);
    }

    #[test]
    fn test_outdated_keys_rejected() {
        let mut body = minimal_body();
        body["updatedData"]["newRuns"] = json!([]);
        let err = validate_update_request(&body.to_string()).unwrap_err();
        assert!(err.to_string().starts_with("Outdated version"));

        let mut body = minimal_body();
        body["numberOfRuns"] = json!(3);
        assert!(contains_outdated_keys(&body));
    }

    #[test]
    fn test_sheet_id_accepts_string() {
        let mut body = minimal_body();
        body["keys"]["sheetId"] = json!("123456");
        let req = validate_update_request(&body.to_string()).unwrap();
        assert_eq!(req.keys.sheet_id, 123456);
    }

    #[test]
    fn test_null_pokemon_is_empty_zone() {
        let mut body = minimal_body();
        body["updatedData"]["runs"]["run-1"]["pokemonData"] = json!({"Route 101": null});
        let req = validate_update_request(&body.to_string()).unwrap();
        let zones = &req.updated_data.runs["run-1"].pokemon_data;
        assert_eq!(zones.get("Route 101"), Some(&None));
    }

    #[test]
    fn test_pokemon_fields() {
        let pokemon: Pokemon = serde_json::from_value(json!({
            "pokedexId": 258,
            "pokemonName": "Mudkip",
            "nickname": "Bubbles",
            "alive": false,
            "ability": "Torrent",
            "level": 12,
            "pid": 3141592653u64,
            "moves": ["Tackle", "Growl", "Water Gun", "Mud-Slap"],
            "nature": "Adamant",
            "IVs": [31, 20, 15, 0, 7, 31]
        }))
        .unwrap();
        assert!(!pokemon.alive);
        assert_eq!(pokemon.pid.as_str(), "3141592653");
        assert_eq!(pokemon.ivs[5].as_str(), "31");
    }

    #[test]
    fn test_run_slot_past_sheet_is_rejected() {
        let body = |slot: Value| {
            json!({
                "keys": {"spreadsheetId": "doc", "sheetId": 0},
                "runSlot": slot,
                "pokemonData": {}
            })
            .to_string()
        };
        let err = validate_pokemon_cards_request(&body(json!(u64::MAX))).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().starts_with("Invalid runSlot"));

        let ok = validate_pokemon_cards_request(&body(json!(MAX_RUN_SLOT))).unwrap();
        assert_eq!(ok.run_slot, Some(MAX_RUN_SLOT));
    }

    #[test]
    fn test_partial_run_data_is_empty() {
        assert!(PartialRunData::default().is_empty());
        let partial: PartialRunData = serde_json::from_value(json!({"gymBadges": 2})).unwrap();
        assert!(!partial.is_empty());
    }
}
