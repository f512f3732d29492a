//! The pure state-transition function.
//!
//! [`apply`] is the only thing that ever produces a [`TripModel`]. It performs
//! no I/O, reads no clock and draws no randomness: ids and snapshots are
//! carried by the command itself, so replaying the same journal prefix always
//! yields the same model.

use jiff::{civil::Date, Span};

use crate::{
    command::Command,
    models::{Country, Item, TripModel, Value},
};

/// Applies one journalable command to a model.
///
/// Commands the reducer never sees (undo/redo markers and the
/// non-journalable session commands) leave the model unchanged; callers
/// filter them out before replay.
pub fn apply(mut model: TripModel, command: &Command) -> TripModel {
    match command {
        Command::CreateTrip { trip, name } => {
            model.id = trip.clone();
            model.name = name.clone();
        }
        Command::AddItem { id, fields } => {
            if let Some(id) = id {
                model.items.push(Item::new(id.clone(), fields.clone()));
            }
        }
        Command::EditItem { id, changes } => {
            if let Some(item) = model.item_mut(id) {
                for (key, value) in changes {
                    item.fields.insert(key.clone(), value.clone());
                }
            }
        }
        Command::DeleteItem { id, .. } => {
            model.items.retain(|item| item.id != *id);
        }
        Command::MoveRange { from, to, days } => {
            shift_items(&mut model, *days, |date| date >= *from && date <= *to);
        }
        Command::InsertGap { date } => {
            shift_items(&mut model, 1, |d| d >= *date);
        }
        Command::RemoveRange { date } => {
            shift_items(&mut model, -1, |d| d >= *date);
        }
        Command::AddCountry { name, code } => {
            match model
                .countries
                .iter_mut()
                .find(|country| country.name.eq_ignore_ascii_case(name))
            {
                Some(country) => {
                    if code.is_some() {
                        country.code.clone_from(code);
                    }
                }
                None => model.countries.push(Country {
                    name: name.clone(),
                    code: code.clone(),
                }),
            }
        }
        Command::RefreshCountries => {
            model.countries = refreshed_countries(&model);
        }
        Command::SetPreference { key, value } => {
            model.preferences.insert(key.clone(), value.clone());
        }
        Command::Mark { .. }
        | Command::Unmark { .. }
        | Command::DeclareIntent { .. }
        | Command::Undo { .. }
        | Command::Redo { .. }
        | Command::SwitchTrip { .. }
        | Command::SwitchAiModel { .. }
        | Command::WebSearch { .. }
        | Command::Help { .. }
        | Command::Renormalize => {}
    }
    model
}

/// Replays commands in order from the empty model.
pub fn replay<'a>(commands: impl IntoIterator<Item = &'a Command>) -> TripModel {
    commands
        .into_iter()
        .filter(|command| command.is_journalable())
        .fold(TripModel::default(), apply)
}

/// Moves every dated item matching `selects` by `days`. Items without a
/// parseable date, or whose shifted date would overflow, stay put.
fn shift_items(model: &mut TripModel, days: i64, selects: impl Fn(Date) -> bool) {
    for item in &mut model.items {
        let Some(date) = item.date() else { continue };
        if !selects(date) {
            continue;
        }
        let moved = Span::new()
            .try_days(days)
            .and_then(|span| date.checked_add(span));
        if let Ok(moved) = moved {
            item.fields
                .insert("date".to_string(), Value::Text(moved.to_string()));
        }
    }
}

/// Countries named by the items' `country` field, in order of first
/// appearance. Codes already known for a country are kept.
fn refreshed_countries(model: &TripModel) -> Vec<Country> {
    let mut countries: Vec<Country> = Vec::new();
    for item in &model.items {
        let name = item.text("country");
        let name = name.trim();
        if name.is_empty()
            || countries
                .iter()
                .any(|country| country.name.eq_ignore_ascii_case(name))
        {
            continue;
        }
        let code = model
            .countries
            .iter()
            .find(|country| country.name.eq_ignore_ascii_case(name))
            .and_then(|country| country.code.clone());
        countries.push(Country {
            name: name.to_string(),
            code,
        });
    }
    countries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_line;

    fn run(lines: &[&str]) -> TripModel {
        let commands: Vec<Command> = lines.iter().map(|l| parse_line(l).unwrap()).collect();
        replay(&commands)
    }

    #[test]
    fn create_sets_identity() {
        let model = run(&[r#"/create-trip paris name="Paris in spring""#]);
        assert_eq!(model.id, "paris");
        assert_eq!(model.name, "Paris in spring");
        assert!(model.items.is_empty());
    }

    #[test]
    fn add_then_delete_leaves_remaining_item() {
        let model = run(&[
            r#"/add id=1 name="A""#,
            r#"/add id=2 name="B""#,
            r#"/delete 1"#,
        ]);
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.items[0].id, "2");
        assert_eq!(model.items[0].name(), "B");
    }

    #[test]
    fn edit_replaces_only_named_fields() {
        let model = run(&[
            r#"/add id=1 name="Louvre" type=museum notes="book ahead""#,
            r#"/edit 1 notes="" price=17"#,
        ]);
        let item = model.item("1").unwrap();
        assert_eq!(item.field("notes"), Some(&Value::blank()));
        assert_eq!(item.field("price"), Some(&Value::Number("17".into())));
        assert_eq!(item.name(), "Louvre");
        assert_eq!(item.kind(), "museum");
    }

    #[test]
    fn move_range_shifts_only_dates_in_range() {
        let model = run(&[
            r#"/add id=1 name="A" date=2025-03-01"#,
            r#"/add id=2 name="B" date=2025-03-02"#,
            r#"/add id=3 name="C""#,
            r#"/move-range from=2025-03-01 to=2025-03-01 days=1"#,
        ]);
        assert_eq!(model.item("1").unwrap().date(), Some(jiff::civil::date(2025, 3, 2)));
        assert_eq!(model.item("2").unwrap().date(), Some(jiff::civil::date(2025, 3, 2)));
        assert_eq!(model.item("3").unwrap().text("date"), "");
    }

    #[test]
    fn insert_gap_and_remove_range_shift_from_pivot() {
        let model = run(&[
            r#"/add id=1 name="A" date=2025-02-28"#,
            r#"/add id=2 name="B" date=2025-03-01"#,
            r#"/insert-gap 2025-03-01"#,
        ]);
        assert_eq!(model.item("1").unwrap().text("date"), "2025-02-28");
        assert_eq!(model.item("2").unwrap().text("date"), "2025-03-02");

        let model = apply(model, &parse_line("/remove-range 2025-03-02").unwrap());
        assert_eq!(model.item("1").unwrap().text("date"), "2025-02-28");
        assert_eq!(model.item("2").unwrap().text("date"), "2025-03-01");
    }

    #[test]
    fn countries_are_deduplicated_and_refreshed() {
        let model = run(&[
            r#"/add-country France code=FR"#,
            r#"/add-country france"#,
            r#"/add id=1 name="Sagrada Familia" country=Spain"#,
            r#"/add id=2 name="Eiffel Tower" country=France"#,
            r#"/add id=3 name="Park Güell" country=Spain"#,
        ]);
        assert_eq!(model.countries.len(), 1);
        assert_eq!(model.countries[0].code.as_deref(), Some("FR"));

        let model = apply(model, &Command::RefreshCountries);
        let names: Vec<&str> = model.countries.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Spain", "France"]);
        assert_eq!(model.countries[1].code.as_deref(), Some("FR"));
    }

    #[test]
    fn preferences_keep_cleared_keys() {
        let model = run(&[
            r#"/set-preference currency value=EUR"#,
            r#"/set-preference currency value="""#,
        ]);
        assert_eq!(model.preferences.get("currency"), Some(&Value::blank()));
    }

    #[test]
    fn session_commands_do_not_touch_the_model() {
        let before = run(&[r#"/add id=1 name="A""#]);
        let after = [
            "/mark 1",
            "/intent \"tidy up\"",
            "/undo",
            "/search \"hotels\"",
            "/help",
        ]
        .iter()
        .map(|l| parse_line(l).unwrap())
        .fold(before.clone(), |model, command| apply(model, &command));
        assert_eq!(before, after);
    }
}
