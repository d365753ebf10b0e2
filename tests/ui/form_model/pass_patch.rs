use arenakit::form::{FieldKey, FormModel};

#[derive(Clone, arenakit::form::FormModel)]
pub struct FixtureForm {
    home_team: String,
    away_team: String,
    round: u16,
}

fn main() {
    let mut model = FixtureForm {
        home_team: "Falcons".to_string(),
        away_team: "Herons".to_string(),
        round: 1,
    };
    let original = model.clone();

    let written = model.apply_patch(FixtureFormPatch::new().away_team("Otters").round(2u16));
    assert_eq!(
        written,
        vec![FieldKey::new("away_team"), FieldKey::new("round")]
    );
    assert!(model.field_differs(&original, FieldKey::new("round")));
    assert!(!model.field_differs(&original, FieldKey::new("home_team")));
    assert_eq!(FixtureForm::field_key("home_team"), Some(FieldKey::new("home_team")));
    assert_eq!(FixtureForm::FIELD_KEYS.len(), 3);
}
