use arenakit::form::{FieldLens, FormModel};

#[derive(Clone, arenakit::form::FormModel)]
struct VenueForm {
    name: String,
}

fn main() {
    let fields = VenueForm::fields();
    let lens = fields.name();
    let mut model = VenueForm {
        name: "North Arena".to_string(),
    };
    lens.set(&mut model, "South Arena".to_string());
    assert_eq!(lens.key().as_str(), "name");
    assert_eq!(lens.get(&model), "South Arena");
}
