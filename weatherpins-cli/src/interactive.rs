use std::fmt;

use inquire::{Confirm, CustomType, InquireError, Select, Text, error::InquireResult};
use weatherpins_core::{Controller, EditMode, FieldEdit, Location, LocationId};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Lookup,
    Add,
    Edit,
    Refresh,
    Delete,
    Reload,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::Lookup,
        Action::Add,
        Action::Edit,
        Action::Refresh,
        Action::Delete,
        Action::Reload,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Lookup => "Look up weather",
            Action::Add => "Save a location",
            Action::Edit => "Edit a location",
            Action::Refresh => "Refresh a location's temperature",
            Action::Delete => "Delete a location",
            Action::Reload => "Reload list",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

struct Choice(Location);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render::location_line(&self.0))
    }
}

/// Prompt loop over every controller action. Esc abandons the current
/// action; Ctrl-C or Esc at the menu ends the session.
pub async fn run(ctl: &mut Controller) -> anyhow::Result<()> {
    loop {
        show(ctl);

        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let result = match action {
            Action::Lookup => lookup(ctl).await,
            Action::Add => add(ctl).await,
            Action::Edit => edit(ctl).await,
            Action::Refresh => refresh(ctl).await,
            Action::Delete => delete(ctl).await,
            Action::Reload => {
                ctl.load_locations().await;
                Ok(())
            }
            Action::Quit => return Ok(()),
        };

        match result {
            Ok(()) | Err(InquireError::OperationCanceled) => {}
            Err(InquireError::OperationInterrupted) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

fn show(ctl: &Controller) {
    let state = ctl.state();
    println!();
    if let Some(temp) = state.temperature {
        println!(
            "Current temperature at ({:.4}, {:.4}): {}",
            state.form.latitude,
            state.form.longitude,
            render::temperature(Some(temp))
        );
    }
    render::locations(state);
    render::message(state);
}

async fn lookup(ctl: &mut Controller) -> InquireResult<()> {
    let lat = CustomType::<f64>::new("Latitude:").with_default(ctl.state().form.latitude).prompt()?;
    let lon = CustomType::<f64>::new("Longitude:").with_default(ctl.state().form.longitude).prompt()?;

    ctl.edit_field(FieldEdit::Latitude(lat)).await;
    ctl.edit_field(FieldEdit::Longitude(lon)).await;
    ctl.lookup_weather().await;
    Ok(())
}

async fn add(ctl: &mut Controller) -> InquireResult<()> {
    let address = Text::new("Address:").with_default(&ctl.state().form.address).prompt()?;
    let username = Text::new("Username:").with_default(&ctl.state().form.username).prompt()?;
    let email = Text::new("Email:").with_default(&ctl.state().form.email).prompt()?;

    ctl.edit_field(FieldEdit::Address(address)).await;
    ctl.edit_field(FieldEdit::Username(username)).await;
    ctl.edit_field(FieldEdit::Email(email)).await;
    ctl.add_location().await;
    Ok(())
}

async fn edit(ctl: &mut Controller) -> InquireResult<()> {
    let Some(id) = pick(ctl, "Edit which location?")? else {
        return Ok(());
    };

    ctl.begin_edit(id).await;
    if ctl.state().edit_mode == EditMode::Idle {
        return Ok(());
    }

    match revise(ctl).await {
        Ok(true) => ctl.commit_edit().await,
        Ok(false) => ctl.cancel_edit().await,
        Err(err) => {
            ctl.cancel_edit().await;
            return Err(err);
        }
    }
    Ok(())
}

/// Prompt for new values of the edit fields; `false` means discard.
async fn revise(ctl: &mut Controller) -> InquireResult<bool> {
    let address = Text::new("Address:").with_default(&ctl.state().edit.address).prompt()?;
    let username = Text::new("Username:").with_default(&ctl.state().edit.username).prompt()?;
    let email = Text::new("Email:").with_default(&ctl.state().edit.email).prompt()?;

    ctl.edit_field(FieldEdit::EditAddress(address)).await;
    ctl.edit_field(FieldEdit::EditUsername(username)).await;
    ctl.edit_field(FieldEdit::EditEmail(email)).await;

    Confirm::new("Save changes?").with_default(true).prompt()
}

async fn refresh(ctl: &mut Controller) -> InquireResult<()> {
    let Some(id) = pick(ctl, "Refresh which location?")? else {
        return Ok(());
    };

    if let Some((lat, lon)) = ctl.state().location(&id).map(|l| (l.latitude, l.longitude)) {
        ctl.refresh_location_temperature(id, lat, lon).await;
    }
    Ok(())
}

async fn delete(ctl: &mut Controller) -> InquireResult<()> {
    if let Some(id) = pick(ctl, "Delete which location?")? {
        ctl.delete_location(id).await;
    }
    Ok(())
}

fn pick(ctl: &Controller, prompt: &str) -> InquireResult<Option<LocationId>> {
    let choices: Vec<Choice> = ctl.state().locations.iter().cloned().map(Choice).collect();
    if choices.is_empty() {
        println!("No saved locations.");
        return Ok(None);
    }

    let Choice(location) = Select::new(prompt, choices).prompt()?;
    Ok(Some(location.id))
}
