use anyhow::Result;
use clap::Args;
use grace_core::user::{LoginForm, RegistrationForm, User, validate_recovery_email};
use grace_core::{GraceError, Operation};

use super::user_error;
use crate::app::App;

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long, env = "GRACE_EMAIL")]
    pub email: String,
    #[arg(long, env = "GRACE_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long, env = "GRACE_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub city: String,
    #[arg(long, default_value = "")]
    pub postal_code: String,
    /// Accept the terms of use
    #[arg(long)]
    pub accept_terms: bool,
}

/// Validates the form and signs in. Shared by the dossier commands.
pub async fn sign_in(app: &App, args: LoginArgs) -> Result<User> {
    let form = LoginForm {
        email: args.email,
        password: args.password,
    };
    let (email, password) = form
        .validate()
        .map_err(|e| user_error(e.into(), Operation::Login))?;
    app.session
        .login(&email, &password)
        .await
        .map_err(|e| user_error(e, Operation::Login))
}

pub async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let user = sign_in(app, args).await?;
    print_user(&user);
    Ok(())
}

pub async fn register(app: &App, args: RegisterArgs) -> Result<()> {
    let form = RegistrationForm {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        password: args.password,
        confirm_password: args.confirm_password,
        address: args.address,
        city: args.city,
        postal_code: args.postal_code,
        accepted_terms: args.accept_terms,
    };
    let registration = form
        .validate_with(app.config.validation.min_password_length)
        .map_err(|e| user_error(e.into(), Operation::Register))?;

    match app.session.register(&registration).await {
        Ok(user) => {
            println!("Inscription réussie");
            print_user(&user);
            Ok(())
        }
        Err(GraceError::IncompleteRegistration { user_id, cause }) => {
            eprintln!(
                "Compte {} créé, mais le profil n'a pas pu être enregistré: {}",
                user_id,
                cause.localized_message()
            );
            Err(user_error(*cause, Operation::Register))
        }
        Err(e) => Err(user_error(e, Operation::Register)),
    }
}

pub async fn reset_password(app: &App, email: &str) -> Result<()> {
    let email =
        validate_recovery_email(email).map_err(|e| user_error(e.into(), Operation::ResetPassword))?;
    app.session
        .reset_password(&email)
        .await
        .map_err(|e| user_error(e, Operation::ResetPassword))?;
    println!("Un email de réinitialisation a été envoyé à {}", email);
    Ok(())
}

fn print_user(user: &User) {
    println!("{} <{}>", user.full_name(), user.email);
    println!("  id:        {}", user.id);
    if !user.phone.is_empty() {
        println!("  téléphone: {}", user.phone);
    }
    let location = [user.address.as_str(), user.postal_code.as_str(), user.city.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if !location.is_empty() {
        println!("  adresse:   {}", location);
    }
    if !user.has_profile {
        println!("  (profil incomplet)");
    }
}
