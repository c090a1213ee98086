//! tabby-loader CLI.
//!
//! Thin presentation layer: parses flags, binds each subcommand to one
//! controller operation, and renders status lines. No business logic
//! lives here beyond mapping flags onto the load form.

use std::time::Duration;

use clap::Parser;
use tracing::warn;

use tabby_loader::api::LoraLoadRequest;
use tabby_loader::config::{Cli, Command, Config, LoadFields};
use tabby_loader::preset::{CacheMode, PresetStore};
use tabby_loader::session::{
    build_load_request, build_lora_load_list, LoadForm, LoraStatus, ModelStatus,
    Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "tabby_loader=debug"
    } else {
        "tabby_loader=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(false)
        .init();

    // Load configuration; flags override the file.
    let config = Config::load(&cli.config)?;
    let endpoint = cli.url.unwrap_or_else(|| config.endpoint.clone());
    let admin_key = cli.admin_key.unwrap_or_else(|| config.admin_key.clone());

    let store = PresetStore::new(&config.preset_dir);

    match cli.command {
        // Preset commands are local and never touch the server.
        Command::Presets => {
            for name in store.list()? {
                println!("{name}");
            }
        }
        Command::ShowPreset { name } => {
            let preset = store.read(&name)?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
        Command::SavePreset { name, fields } => {
            let form = assemble_form(&store, &fields)?;
            store.write(&name, &form.to_preset()?)?;
            println!("Preset {name} saved.");
        }
        Command::DeletePreset { name } => {
            store.delete(&name)?;
            println!("Preset {name} deleted.");
        }

        // Everything else needs a connected session.
        command => {
            let mut session =
                Session::new(Duration::from_secs(config.request_timeout_secs));
            session.connect(&endpoint, &admin_key).await?;

            match command {
                Command::Status => {
                    let model = session.current_model().await?;
                    let loras = session.current_loras().await?;
                    print_status(&model, &loras);
                }
                Command::Load { fields } => {
                    let form = assemble_form(&store, &fields)?;
                    let request = build_load_request(&form)?;
                    let (model, loras) = session.load_model(&request).await?;
                    println!("Model successfully loaded.");
                    print_status(&model, &loras);
                }
                Command::Unload => {
                    let (model, loras) = session.unload_model().await?;
                    println!("Model unloaded.");
                    print_status(&model, &loras);
                }
                Command::LoadLoras { loras, scalings } => {
                    for name in &loras {
                        if !session.catalogs().loras.contains(name) {
                            warn!(lora = %name, "Adapter is not in the server's LoRA catalog");
                        }
                    }
                    // Unscaled adapters default to 1.0.
                    let scalings = if scalings.is_empty() {
                        vec!["1.0".to_string(); loras.len()]
                    } else {
                        scalings
                    };
                    let entries = build_lora_load_list(&loras, &scalings)?;
                    let request = LoraLoadRequest { loras: entries };
                    let (model, loras) = session.load_loras(&request).await?;
                    println!("LoRAs successfully loaded.");
                    print_status(&model, &loras);
                }
                Command::UnloadLoras => {
                    let (model, loras) = session.unload_loras().await?;
                    println!("All LoRAs unloaded.");
                    print_status(&model, &loras);
                }
                // Preset commands were handled above.
                _ => unreachable!(),
            }
        }
    }

    Ok(())
}

/// Hydrate the load form from a preset (when given) and apply the
/// remaining field flags on top.
fn assemble_form(store: &PresetStore, fields: &LoadFields) -> anyhow::Result<LoadForm> {
    let mut form = match &fields.preset {
        Some(name) => LoadForm::from_preset(&store.read(name)?),
        None => LoadForm::default(),
    };

    if let Some(model) = &fields.model {
        form.model_name = model.clone();
    }
    if let Some(len) = fields.max_seq_len {
        form.max_seq_len = Some(len);
    }
    if let Some(len) = fields.override_base_seq_len {
        form.override_base_seq_len = Some(len);
    }
    if let Some(split) = &fields.gpu_split {
        form.gpu_split = split.clone();
        form.gpu_split_auto = false;
    }
    if let Some(scale) = fields.rope_scale {
        form.rope_scale = Some(scale);
    }
    if let Some(alpha) = fields.rope_alpha {
        form.rope_alpha = Some(alpha);
    }
    if fields.no_flash_attention {
        form.no_flash_attention = true;
    }
    if let Some(mode) = &fields.cache_mode {
        form.cache_mode = Some(match mode.as_str() {
            "FP8" => CacheMode::Fp8,
            _ => CacheMode::Fp16,
        });
    }
    if let Some(template) = &fields.prompt_template {
        form.prompt_template = Some(template.clone());
    }
    if let Some(experts) = fields.num_experts_per_token {
        form.num_experts_per_token = Some(experts);
    }
    if let Some(draft) = &fields.draft_model {
        form.draft_model_name = draft.clone();
    }
    if let Some(scale) = fields.draft_rope_scale {
        form.draft_rope_scale = Some(scale);
    }
    if let Some(alpha) = fields.draft_rope_alpha {
        form.draft_rope_alpha = Some(alpha);
    }

    Ok(form)
}

fn print_status(model: &Option<ModelStatus>, loras: &[LoraStatus]) {
    match model {
        Some(status) => println!("Current model: {status}"),
        None => println!("Current model: none"),
    }
    if loras.is_empty() {
        println!("Current LoRAs: none");
    } else {
        let summary = loras
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("Current LoRAs: {summary}");
    }
}
