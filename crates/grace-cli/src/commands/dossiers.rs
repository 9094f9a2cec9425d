use anyhow::{Context, Result, bail};
use clap::Subcommand;
use grace_application::DossierService;
use grace_core::Operation;
use grace_core::dossier::{Dossier, DossierPatch, DossierStatus, DossierType, NewDossier};
use grace_core::navigation::{Route, is_reachable};

use super::auth::{LoginArgs, sign_in};
use super::user_error;
use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum DossierAction {
    /// List dossiers, most recent first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Create a dossier (canonical title when --title is omitted)
    Create {
        /// auto, habitation, sante, vie, pro, voyage
        #[arg(long = "type")]
        dossier_type: DossierType,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show one dossier
    Get {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Update fields of a dossier
    Update {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "type")]
        dossier_type: Option<DossierType>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        documents_count: Option<u32>,
    },
    /// Delete a dossier
    Delete { id: String },
}

pub async fn run(app: &App, credentials: LoginArgs, action: DossierAction) -> Result<()> {
    let user = sign_in(app, credentials).await?;
    if !is_reachable(&Route::DossierList, &app.session.state()) {
        bail!("Session non authentifiée");
    }
    let user_id = user.id.as_str();

    match action {
        DossierAction::List { json } => {
            let dossiers = app
                .dossiers
                .list(user_id)
                .await
                .map_err(|e| user_error(e, Operation::LoadDossiers))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dossiers)?);
            } else if dossiers.is_empty() {
                println!("Aucun dossier");
            } else {
                for dossier in &dossiers {
                    print_row(dossier);
                }
                print_status_summary(&dossiers);
            }
        }
        DossierAction::Create {
            dossier_type,
            title,
            description,
        } => {
            let new = match title {
                Some(title) => NewDossier::new(title, dossier_type)
                    .with_description(description.unwrap_or_default()),
                None => {
                    let mut new = NewDossier::for_type(dossier_type);
                    if let Some(description) = description {
                        new.description = description;
                    }
                    new
                }
            };
            let dossier = app
                .dossiers
                .create(user_id, new)
                .await
                .map_err(|e| user_error(e, Operation::CreateDossier))?;
            println!("Dossier créé: {}", dossier.id);
        }
        DossierAction::Get { id, json } => {
            let dossier = app
                .dossiers
                .get(user_id, &id)
                .await
                .map_err(|e| user_error(e, Operation::LoadDossier))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dossier)?);
            } else {
                print_detail(&dossier);
            }
        }
        DossierAction::Update {
            id,
            status,
            title,
            dossier_type,
            description,
            documents_count,
        } => {
            let patch = DossierPatch {
                title,
                dossier_type,
                status: status.map(DossierStatus::from),
                description,
                documents_count,
            };
            if patch.is_empty() {
                bail!("Rien à mettre à jour");
            }
            app.dossiers
                .update(user_id, &id, &patch)
                .await
                .map_err(|e| anyhow::anyhow!(e.localized_message()))
                .with_context(|| format!("Mise à jour de {} impossible", id))?;
            println!("Dossier {} mis à jour", id);
        }
        DossierAction::Delete { id } => {
            app.dossiers
                .delete(user_id, &id)
                .await
                .map_err(|e| user_error(e, Operation::DeleteDossier))?;
            println!("Dossier {} supprimé", id);
        }
    }
    Ok(())
}

fn print_row(dossier: &Dossier) {
    println!(
        "{:<20} {:<12} {:<11} {}",
        dossier.id,
        dossier.status.as_str(),
        dossier.dossier_type.as_str(),
        dossier.title
    );
}

fn print_status_summary(dossiers: &[Dossier]) {
    let summary = DossierService::tally_statuses(dossiers)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(status, count)| format!("{}: {}", status, count))
        .collect::<Vec<_>>()
        .join(" | ");
    println!("\n{} dossier(s) | {}", dossiers.len(), summary);
}

fn print_detail(dossier: &Dossier) {
    println!("{}", dossier.title);
    println!("  id:          {}", dossier.id);
    println!("  type:        {}", dossier.dossier_type.label());
    println!("  statut:      {}", dossier.status);
    if !dossier.description.is_empty() {
        println!("  description: {}", dossier.description);
    }
    println!("  documents:   {}", dossier.documents_count);
    println!("  créé le:     {}", dossier.created_at.format("%d/%m/%Y %H:%M"));
    println!("  modifié le:  {}", dossier.updated_at.format("%d/%m/%Y %H:%M"));
}
