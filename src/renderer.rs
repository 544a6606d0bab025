//! Run card and Pokémon card layouts
//!
//! Every coordinate below is relative to a [`Card`]; the geometry module turns
//! it into an absolute range. New run blocks are always rendered at slot 0
//! right after inserting [`RUN_BLOCK_HEIGHT`] rows at the top of the sheet.
//!
//! Run card layout (rows relative to the block, columns 0..10):
//!
//! | rows  | content                                      |
//! |-------|----------------------------------------------|
//! | 0     | grey band                                    |
//! | 1     | light grey band                              |
//! | 2     | run counter                                  |
//! | 3..7  | start, end, won battles, dead Pokémon        |
//! | 7     | hidden run id marker                         |
//! | 8..11 | badge label and strip                        |
//! | 12..17| personal best trainer and team               |
//! | 17    | light grey band                              |

use crate::catalog::{Lang, Nature, BADGES, ZONES};
use crate::error::Result;
use crate::geometry::{Card, BAND_WIDTH, MARKER_ROW, RUN_BLOCK_HEIGHT};
use crate::model::{CellText, PartialRunData, PersonalBest, Pokemon, PokemonData, RunData};
use crate::requests::{Background, CellContent, CellStyle, Foreground, RequestBatch};

/// Prefix of the hidden marker cell that identifies a run block.
pub const RUN_ID_MARKER_PREFIX: &str = "RunId : ";

const PERSONAL_BEST_LABEL: &str = "Personal Best :";

/// Reads the counter of the block below (the previous run) and adds one.
const RUN_COUNTER_FORMULA: &str = r#"=IFERROR("Run #" & (1 + VALUE(REGEXEXTRACT(INDIRECT("B" & ROW() + 18), "\d+"))), "Run #1")"#;

const DEAD_MARKER: &str = "💀";

/// Text of the marker cell for a run.
pub fn run_id_marker(run_id: &str) -> String {
    format!("{}{}", RUN_ID_MARKER_PREFIX, run_id)
}

/// Sprite lookup by name in the `Sprites` sheet.
fn named_sprite(key: &str) -> CellContent {
    CellContent::formula(format!(
        "=VLOOKUP(\"{}\",Sprites!$A:$B,2,FALSE)",
        key.replace('"', "\"\"")
    ))
}

/// Sprite lookup by national dex number in the `Sprites` sheet.
fn species_sprite(pokedex_id: u32) -> CellContent {
    CellContent::formula(format!("=VLOOKUP({},Sprites!$A:$B,2,FALSE)", pokedex_id))
}

fn badge_sprite(index: usize) -> CellContent {
    named_sprite(BADGES[index])
}

fn trainer_sprite(personal_best: Option<&PersonalBest>) -> CellContent {
    match personal_best {
        Some(pb) if !pb.trainer_sprite.is_empty() => named_sprite(&pb.trainer_sprite),
        _ => CellContent::blank(),
    }
}

/// Trainer team, three sprites on top and three below.
fn render_team(
    batch: &mut RequestBatch,
    card: &Card,
    team: &[u32],
    style: CellStyle,
) -> Result<()> {
    for slot in 0..6 {
        let (top, column) = if slot < 3 { (13, 5 + slot) } else { (15, 2 + slot) };
        let content = team
            .get(slot)
            .map_or_else(CellContent::blank, |id| species_sprite(*id));
        batch.set_cell_content(card.range(top, top + 2, column, column + 1)?, content, style);
    }
    Ok(())
}

/// Render a brand-new run block at the top of the sheet (slot 0).
pub fn generate_run_card(
    batch: &mut RequestBatch,
    sheet_id: i64,
    run_id: &str,
    run: &RunData,
    lang: Lang,
) -> Result<()> {
    tracing::debug!(run_id, badges = run.gym_badges, "rendering new run card");
    let card = Card::run(sheet_id, 0);
    let merged = CellStyle::new().merge();
    let merged_center = merged.center();

    batch.insert_rows(sheet_id, RUN_BLOCK_HEIGHT);
    batch.clear_formatting(card.range(1, RUN_BLOCK_HEIGHT, 0, BAND_WIDTH)?);

    batch.update_column_size(sheet_id, 21, 0, 1);
    batch.update_column_size(sheet_id, 55, 1, 8);
    batch.update_column_size(sheet_id, 21, 9, 1);

    // Side separators
    let light_band = merged.background(Background::LightGrey);
    batch.set_cell_content(card.range(2, 17, 0, 1)?, CellContent::blank(), light_band);
    batch.set_cell_content(card.range(2, 17, 9, 10)?, CellContent::blank(), light_band);

    // Opening bands
    let grey_band = merged.background(Background::Grey);
    batch.set_cell_content(card.range(0, 1, 0, BAND_WIDTH)?, CellContent::blank(), grey_band);
    batch.set_cell_content(card.range(1, 2, 0, BAND_WIDTH)?, CellContent::blank(), light_band);

    batch.set_cell_content(
        card.range(2, 3, 1, 9)?,
        CellContent::formula(RUN_COUNTER_FORMULA),
        merged_center
            .bold()
            .foreground(Foreground::Cyan)
            .background(Background::Grey),
    );

    let fields = [
        (lang.run_start(), &run.run_start),
        (lang.run_end(), &run.run_end),
        (lang.won_battles(), &run.won_battles),
        (lang.dead_pokemon(), &run.dead_pokemon),
    ];
    for (offset, (label, value)) in fields.into_iter().enumerate() {
        let row = 3 + offset;
        batch.set_cell_content(
            card.range(row, row + 1, 1, 5)?,
            CellContent::text(label),
            merged_center.bold(),
        );
        batch.set_cell_content(
            card.range(row, row + 1, 5, 9)?,
            CellContent::text(value.as_str()),
            merged_center,
        );
    }

    // White on white: invisible, but readable by the locator
    batch.set_cell_content(
        card.range(MARKER_ROW, MARKER_ROW + 1, 1, 9)?,
        CellContent::text(run_id_marker(run_id)),
        merged_center.foreground(Foreground::White),
    );

    batch.set_cell_content(
        card.range(8, 9, 1, 9)?,
        CellContent::text(lang.gym_badges()),
        merged_center.bold(),
    );
    for i in 0..BADGES.len() {
        let content = if i < usize::from(run.gym_badges) {
            badge_sprite(i)
        } else {
            CellContent::blank()
        };
        batch.set_cell_content(card.range(9, 11, i + 1, i + 2)?, content, merged_center);
    }

    batch.merge_cells(card.range(11, 12, 1, 9)?);

    let personal_best = run.personal_best.as_ref();
    batch.set_cell_content(card.range(12, 13, 1, 9)?, CellContent::blank(), merged_center);
    batch.set_cell_bold_split_content(
        card.range(12, 13, 1, 9)?,
        PERSONAL_BEST_LABEL,
        personal_best.map_or("", |pb| pb.trainer_name.as_str()),
    );

    for column in [1, 4, 8] {
        batch.merge_cells(card.range(13, 17, column, column + 1)?);
    }
    batch.set_cell_content(
        card.range(13, 17, 2, 4)?,
        trainer_sprite(personal_best),
        merged_center,
    );
    render_team(
        batch,
        &card,
        personal_best.map_or(&[][..], |pb| pb.trainer_team.as_slice()),
        merged_center,
    )?;

    // Closing bands, the grey one is shared with the block below
    batch.set_cell_content(card.range(17, 18, 0, BAND_WIDTH)?, CellContent::blank(), light_band);
    batch.set_cell_content(card.range(18, 19, 0, BAND_WIDTH)?, CellContent::blank(), grey_band);

    batch.add_borders(card.range(2, 17, 1, 9)?);
    Ok(())
}

/// Patch the fields present in `run` on an existing block.
///
/// Badges are only ever added: a lower `gymBadges` leaves the extra badge
/// sprites in place.
pub fn update_run_card(
    batch: &mut RequestBatch,
    sheet_id: i64,
    run_slot: usize,
    run: &PartialRunData,
) -> Result<()> {
    tracing::debug!(run_slot, "patching run card");
    let card = Card::run(sheet_id, run_slot);
    let center = CellStyle::new().center();

    let fields: [(usize, Option<&CellText>); 4] = [
        (3, run.run_start.as_ref()),
        (4, run.run_end.as_ref()),
        (5, run.won_battles.as_ref()),
        (6, run.dead_pokemon.as_ref()),
    ];
    for (row, value) in fields {
        if let Some(value) = value {
            batch.set_cell_content(
                card.range(row, row + 1, 5, 9)?,
                CellContent::text(value.as_str()),
                center,
            );
        }
    }

    let badges = run.gym_badges.map_or(0, usize::from).min(BADGES.len());
    for i in 0..badges {
        batch.set_cell_content(card.range(9, 11, i + 1, i + 2)?, badge_sprite(i), center);
    }

    if let Some(pb) = &run.personal_best {
        batch.set_cell_bold_split_content(
            card.range(12, 13, 1, 9)?,
            PERSONAL_BEST_LABEL,
            &pb.trainer_name,
        );
        batch.set_cell_content(card.range(13, 17, 2, 4)?, trainer_sprite(Some(pb)), center);
        render_team(batch, &card, &pb.trainer_team, center)?;
    }

    Ok(())
}

/// Render the card of one zone. `None` resets the card to an empty merged
/// placeholder; `Some` unmerges and draws the whole Pokémon.
pub fn generate_pokemon_card(
    batch: &mut RequestBatch,
    sheet_id: i64,
    pokemon: Option<&Pokemon>,
    zone: &str,
    run_slot: usize,
    zone_slot: usize,
    lang: Lang,
) -> Result<()> {
    let card = Card::pokemon(sheet_id, run_slot, zone_slot);
    let column = card.origin_column();
    let center = CellStyle::new().center();
    let merged_center = center.merge();

    batch.update_column_size(sheet_id, 75, column, 1);
    batch.update_column_size(sheet_id, 21, column + 1, 1);
    batch.update_column_size(sheet_id, 75, column + 2, 1);
    batch.update_column_size(sheet_id, 21, column + 3, 2);

    batch.add_borders(card.range(0, 15, 0, 4)?);
    batch.set_cell_content(
        card.range(0, 15, 4, 5)?,
        CellContent::blank(),
        CellStyle::new().merge().background(Background::LightGrey),
    );
    batch.set_cell_content(
        card.range(0, 1, 0, 4)?,
        CellContent::text(zone),
        merged_center
            .bold()
            .foreground(Foreground::Cyan)
            .background(Background::Grey),
    );

    // Reset whatever layout the card had before
    batch.unmerge_cells(card.range(1, 15, 0, 4)?);

    let Some(pokemon) = pokemon else {
        batch.merge_cells(card.range(1, 15, 0, 4)?);
        batch.empty_cell(card.range(1, 2, 0, 1)?);
        return Ok(());
    };

    batch.set_cell_content(
        card.range(1, 5, 0, 4)?,
        species_sprite(pokemon.pokedex_id),
        merged_center,
    );

    // Dead Pokémon give up the last column of the name line to a skull
    let name_right = if pokemon.alive { 4 } else { 3 };
    batch.unmerge_cells(card.range(5, 6, 0, 4)?);
    batch.set_cell_content(card.range(5, 6, 0, name_right)?, CellContent::blank(), merged_center);
    batch.set_cell_bold_split_content(
        card.range(5, 6, 0, name_right)?,
        &pokemon.nickname,
        &format!("({})", pokemon.pokemon_name),
    );
    if !pokemon.alive {
        batch.set_cell_content(
            card.range(5, 6, 3, 4)?,
            CellContent::text(DEAD_MARKER),
            center.background(Background::Black),
        );
    }

    batch.set_cell_content(
        card.range(6, 7, 0, 2)?,
        CellContent::text(pokemon.ability.as_str()),
        merged_center,
    );
    batch.set_cell_content(
        card.range(6, 7, 2, 4)?,
        CellContent::text(format!("{} {}", lang.level(), pokemon.level)),
        merged_center,
    );

    // Personality value, hidden like the run marker
    batch.set_cell_content(
        card.range(7, 8, 0, 4)?,
        CellContent::text(pokemon.pid.as_str()),
        merged_center.foreground(Foreground::White),
    );

    for i in 0..4 {
        let row = 8 + i / 2;
        let left = 2 * (i % 2);
        let name = pokemon.moves.get(i).map_or("", String::as_str);
        batch.set_cell_content(
            card.range(row, row + 1, left, left + 2)?,
            CellContent::text(name),
            merged_center,
        );
    }

    batch.merge_cells(card.range(10, 11, 0, 4)?);

    let nature = Nature::from_name(&pokemon.nature);
    if nature.is_none() && !pokemon.nature.is_empty() {
        tracing::warn!(nature = %pokemon.nature, zone, "unknown nature, stats left uncolored");
    }
    let nature_label = nature.map_or(pokemon.nature.as_str(), |n| n.name(lang));
    batch.set_cell_content(
        card.range(11, 12, 0, 4)?,
        CellContent::text(nature_label),
        merged_center.bold(),
    );

    let (buffed, debuffed) = nature.map_or((None, None), Nature::modifiers);
    let buffed = buffed.map(|s| s.index());
    let debuffed = debuffed.map(|s| s.index());
    let stat_names = lang.stat_names();
    for (i, stat_name) in stat_names.iter().enumerate() {
        let row = 12 + i % 3;
        let left = 2 * (i / 3);
        batch.set_cell_content(
            card.range(row, row + 1, left, left + 1)?,
            CellContent::text(*stat_name),
            center,
        );

        let mut style = center;
        if buffed == Some(i) {
            style = style.foreground(Foreground::Red).bold();
        } else if debuffed == Some(i) {
            style = style.foreground(Foreground::LightRed);
        }
        let value = pokemon.ivs.get(i).map_or("", CellText::as_str);
        batch.set_cell_content(
            card.range(row, row + 1, left + 1, left + 2)?,
            CellContent::text(value),
            style,
        );
    }

    Ok(())
}

/// Render a full block for a new run: the run card, then one card per zone
/// of the catalog, with captures taken from `pokemon_data`.
pub fn generate_run_block(
    batch: &mut RequestBatch,
    sheet_id: i64,
    run_id: &str,
    run: &RunData,
    pokemon_data: &PokemonData,
    lang: Lang,
) -> Result<()> {
    generate_run_card(batch, sheet_id, run_id, run, lang)?;
    for (zone_slot, zone) in ZONES.iter().enumerate() {
        let pokemon = pokemon_data.get(*zone).and_then(Option::as_ref);
        generate_pokemon_card(batch, sheet_id, pokemon, zone, 0, zone_slot, lang)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{ExtendedValue, Request};

    fn mudkip(alive: bool) -> Pokemon {
        Pokemon {
            pokedex_id: 258,
            pokemon_name: "Mudkip".to_string(),
            nickname: "Bubbles".to_string(),
            alive,
            ability: "Torrent".to_string(),
            level: 14,
            pid: CellText("123456789".to_string()),
            moves: vec!["Tackle".into(), "Growl".into(), "Water Gun".into()],
            nature: "Adamant".to_string(),
            ivs: [31, 20, 15, 0, 7, 31]
                .iter()
                .map(|v| CellText(v.to_string()))
                .collect(),
        }
    }

    /// Text or formula written to the cell starting at (row, column).
    fn value_at(batch: &RequestBatch, row: usize, column: usize) -> Option<String> {
        batch.requests().iter().rev().find_map(|r| match r {
            Request::RepeatCell(rc)
                if rc.range.start_row_index == row && rc.range.start_column_index == column =>
            {
                rc.cell.user_entered_value.as_ref().map(|v| match v {
                    ExtendedValue::StringValue(s) | ExtendedValue::FormulaValue(s) => s.clone(),
                })
            }
            _ => None,
        })
    }

    #[test]
    fn test_run_card_starts_with_row_insertion() {
        let mut batch = RequestBatch::new();
        generate_run_card(&mut batch, 0, "abc", &RunData::default(), Lang::En).unwrap();
        assert!(matches!(
            batch.requests()[0],
            Request::InsertDimension(ref r) if r.range.end_index == RUN_BLOCK_HEIGHT
        ));
    }

    #[test]
    fn test_run_card_marker_and_labels() {
        let mut batch = RequestBatch::new();
        let run = RunData {
            won_battles: CellText("4".into()),
            ..RunData::default()
        };
        generate_run_card(&mut batch, 0, "abc", &run, Lang::Fr).unwrap();
        assert_eq!(value_at(&batch, 7, 1).as_deref(), Some("RunId : abc"));
        assert_eq!(value_at(&batch, 5, 1).as_deref(), Some("Combats gagnés"));
        assert_eq!(value_at(&batch, 5, 5).as_deref(), Some("4"));
        assert_eq!(value_at(&batch, 2, 1).as_deref(), Some(RUN_COUNTER_FORMULA));
    }

    #[test]
    fn test_run_card_without_personal_best() {
        let mut batch = RequestBatch::new();
        generate_run_card(&mut batch, 0, "abc", &RunData::default(), Lang::En).unwrap();
        assert_eq!(value_at(&batch, 13, 2).as_deref(), Some(""));
        assert_eq!(value_at(&batch, 13, 5).as_deref(), Some(""));
    }

    #[test]
    fn test_team_layout_three_over_three() {
        let mut batch = RequestBatch::new();
        let pb = PersonalBest {
            trainer_name: "Roxanne".into(),
            trainer_sprite: "Roxanne".into(),
            trainer_team: vec![74, 299, 75, 76],
        };
        let run = PartialRunData {
            personal_best: Some(pb),
            ..PartialRunData::default()
        };
        update_run_card(&mut batch, 0, 1, &run).unwrap();
        assert_eq!(
            value_at(&batch, 31, 5).as_deref(),
            Some("=VLOOKUP(74,Sprites!$A:$B,2,FALSE)")
        );
        assert_eq!(
            value_at(&batch, 33, 5).as_deref(),
            Some("=VLOOKUP(76,Sprites!$A:$B,2,FALSE)")
        );
        assert_eq!(value_at(&batch, 33, 6).as_deref(), Some(""));
        assert_eq!(
            value_at(&batch, 31, 2).as_deref(),
            Some("=VLOOKUP(\"Roxanne\",Sprites!$A:$B,2,FALSE)")
        );
    }

    #[test]
    fn test_dead_pokemon_gets_skull() {
        let mut batch = RequestBatch::new();
        generate_pokemon_card(&mut batch, 0, Some(&mudkip(false)), "Route 101", 0, 2, Lang::En)
            .unwrap();
        // Card origin: row 2, column 20
        assert_eq!(value_at(&batch, 7, 23).as_deref(), Some(DEAD_MARKER));

        let mut batch = RequestBatch::new();
        generate_pokemon_card(&mut batch, 0, Some(&mudkip(true)), "Route 101", 0, 2, Lang::En)
            .unwrap();
        assert_eq!(value_at(&batch, 7, 23), None);
    }

    #[test]
    fn test_nature_colors_stats() {
        let mut batch = RequestBatch::new();
        generate_pokemon_card(&mut batch, 0, Some(&mudkip(true)), "Starter", 0, 0, Lang::En)
            .unwrap();

        let style_of = |row: usize, column: usize| {
            batch.requests().iter().find_map(|r| match r {
                Request::RepeatCell(rc)
                    if rc.range.start_row_index == row
                        && rc.range.start_column_index == column =>
                {
                    rc.cell
                        .user_entered_format
                        .as_ref()
                        .and_then(|f| f.text_format.clone())
                }
                _ => None,
            })
        };

        // Attack (index 1): row 2 + 13, value column 1
        let attack = style_of(15, 11).unwrap();
        assert_eq!(attack.bold, Some(true));
        assert_eq!(attack.foreground_color, Some(Foreground::Red.color()));
        // Sp. Atk (index 3): row 2 + 12, value column 3
        let sp_atk = style_of(14, 13).unwrap();
        assert_eq!(sp_atk.bold, None);
        assert_eq!(sp_atk.foreground_color, Some(Foreground::LightRed.color()));
        // HP untouched
        let hp = style_of(14, 11).unwrap();
        assert_eq!(hp.foreground_color, None);
    }

    #[test]
    fn test_missing_moves_render_blank() {
        let mut batch = RequestBatch::new();
        generate_pokemon_card(&mut batch, 0, Some(&mudkip(true)), "Starter", 0, 0, Lang::En)
            .unwrap();
        // Fourth move: row 2 + 9, column 10 + 2
        assert_eq!(value_at(&batch, 11, 12).as_deref(), Some(""));
        assert_eq!(value_at(&batch, 11, 10).as_deref(), Some("Water Gun"));
    }

    #[test]
    fn test_run_block_covers_every_zone() {
        let mut batch = RequestBatch::new();
        generate_run_block(
            &mut batch,
            0,
            "abc",
            &RunData::default(),
            &PokemonData::new(),
            Lang::En,
        )
        .unwrap();
        for (slot, zone) in ZONES.iter().enumerate() {
            assert_eq!(value_at(&batch, 2, 10 + 5 * slot).as_deref(), Some(*zone));
        }
    }
}
