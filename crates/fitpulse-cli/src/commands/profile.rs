use clap::Subcommand;
use fitpulse_core::storage::{Database, USER_PROFILE_KEY};
use fitpulse_core::{ProfileStore, UserProfile};
use serde::Serialize;

use super::print_json;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the profile as JSON, with BMI
    Show,
    /// Set a profile field (name, age, heightFeet, heightInches, weightLbs, gender, goal, pictureUrl)
    Set {
        /// Field name
        field: String,
        /// New value (empty clears optional fields)
        value: String,
    },
    /// Forget the saved profile
    Reset,
}

#[derive(Serialize)]
struct ProfileView<'a> {
    #[serde(flatten)]
    profile: &'a UserProfile,
    bmi: Option<f64>,
}

fn show(profile: &UserProfile) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&ProfileView {
        profile,
        bmi: profile.bmi().map(|b| (b * 10.0).round() / 10.0),
    })
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = ProfileStore::new(Database::open()?.slot(USER_PROFILE_KEY));

    match action {
        ProfileAction::Show => show(&store.load_or_default())?,
        ProfileAction::Set { field, value } => {
            let mut profile = store.load_or_default();
            profile.set_field(&field, &value)?;
            store.save(&profile)?;
            show(&profile)?;
        }
        ProfileAction::Reset => {
            store.reset()?;
            println!("profile reset");
        }
    }
    Ok(())
}
