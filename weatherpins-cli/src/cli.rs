use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::Text;
use weatherpins_core::{
    Config, Controller, FieldEdit, LocationId, provider::provider_from_config,
    store::store_from_config,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherpins", version, about = "Saved locations with current temperatures")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the document store connection.
    Configure,

    /// Show the current temperature for a coordinate pair.
    Lookup {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List saved locations.
    List,

    /// Save a new location.
    Add {
        #[arg(long)]
        address: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Look up the current temperature first and store it with the location.
        #[arg(long)]
        with_temp: bool,
    },

    /// Change the address or contact details of a saved location.
    Edit {
        id: LocationId,

        #[arg(long)]
        address: Option<String>,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Delete a saved location.
    Delete { id: LocationId },

    /// Fetch and store the current temperature of a saved location.
    Refresh { id: LocationId },

    /// Run an interactive session.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Lookup { lat, lon } => {
                let mut ctl = controller()?;
                set_coordinates(&mut ctl, lat, lon).await;
                ctl.lookup_weather().await;
                if let Some(temp) = ctl.state().temperature {
                    let form = &ctl.state().form;
                    println!(
                        "Current temperature at ({:.4}, {:.4}): {}",
                        form.latitude,
                        form.longitude,
                        render::temperature(Some(temp))
                    );
                }
                finish(&ctl)
            }
            Command::List => {
                let mut ctl = controller()?;
                ctl.load_locations().await;
                finish_with_locations(&ctl)
            }
            Command::Add { address, username, email, lat, lon, with_temp } => {
                let mut ctl = controller()?;
                set_coordinates(&mut ctl, lat, lon).await;
                if with_temp {
                    ctl.lookup_weather().await;
                    finish(&ctl)?;
                }
                ctl.edit_field(FieldEdit::Address(address)).await;
                ctl.edit_field(FieldEdit::Username(username)).await;
                ctl.edit_field(FieldEdit::Email(email)).await;
                ctl.add_location().await;
                finish_with_locations(&ctl)
            }
            Command::Edit { id, address, username, email } => {
                let mut ctl = controller()?;
                ctl.load_locations().await;
                finish(&ctl)?;
                ctl.begin_edit(id).await;
                finish(&ctl)?;
                if let Some(address) = address {
                    ctl.edit_field(FieldEdit::EditAddress(address)).await;
                }
                if let Some(username) = username {
                    ctl.edit_field(FieldEdit::EditUsername(username)).await;
                }
                if let Some(email) = email {
                    ctl.edit_field(FieldEdit::EditEmail(email)).await;
                }
                ctl.commit_edit().await;
                finish_with_locations(&ctl)
            }
            Command::Delete { id } => {
                let mut ctl = controller()?;
                ctl.delete_location(id).await;
                finish_with_locations(&ctl)
            }
            Command::Refresh { id } => {
                let mut ctl = controller()?;
                ctl.load_locations().await;
                finish(&ctl)?;
                let (lat, lon) = ctl
                    .state()
                    .location(&id)
                    .map(|l| (l.latitude, l.longitude))
                    .ok_or_else(|| anyhow!("No saved location with id '{id}'"))?;
                ctl.refresh_location_temperature(id, lat, lon).await;
                finish_with_locations(&ctl)
            }
            Command::Interactive => {
                let mut ctl = controller()?;
                ctl.load_locations().await;
                interactive::run(&mut ctl).await
            }
        }
    }
}

/// Build a controller from the on-disk configuration.
fn controller() -> anyhow::Result<Controller> {
    let config = Config::load()?;
    tracing::debug!(weather_url = %config.weather.base_url, "loaded configuration");
    Ok(Controller::new(provider_from_config(&config), store_from_config(&config)?))
}

async fn set_coordinates(ctl: &mut Controller, lat: Option<f64>, lon: Option<f64>) {
    if let Some(lat) = lat {
        ctl.edit_field(FieldEdit::Latitude(lat)).await;
    }
    if let Some(lon) = lon {
        ctl.edit_field(FieldEdit::Longitude(lon)).await;
    }
}

/// Print the status message; an error message becomes the command's error.
fn finish(ctl: &Controller) -> anyhow::Result<()> {
    match &ctl.state().message {
        Some(msg) if msg.is_error() => bail!("{}", msg.text()),
        _ => {
            render::message(ctl.state());
            Ok(())
        }
    }
}

/// Like [`finish`], but prints the saved locations first when the action succeeded.
fn finish_with_locations(ctl: &Controller) -> anyhow::Result<()> {
    if let Some(listing) = render::listing_after_action(ctl.state()) {
        println!("{listing}");
    }
    finish(ctl)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let project_id = Text::new("Store project id:")
        .with_default(config.store.project_id.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read project id")?;
    if project_id.trim().is_empty() {
        bail!("Project id must not be empty");
    }

    let api_key = Text::new("API key (leave empty for none):")
        .with_default(config.store.api_key.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read API key")?;

    let collection = Text::new("Collection:")
        .with_default(
            config.store.collection.as_deref().unwrap_or(weatherpins_core::config::DEFAULT_COLLECTION),
        )
        .prompt()
        .context("Failed to read collection name")?;

    config.store.project_id = Some(project_id.trim().to_string());
    config.store.api_key = Some(api_key.trim().to_string()).filter(|k| !k.is_empty());
    config.store.collection = Some(collection.trim().to_string()).filter(|c| !c.is_empty());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
