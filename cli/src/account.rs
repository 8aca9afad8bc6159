use anyhow::{bail, Result};
use hasha_core::{
    ConfirmationInput, SignInInput, SignInOutcome, SignInStep, SignUpInput, SignUpStep,
    ValidationErrors,
};

use crate::App;

fn reject(errors: ValidationErrors) -> anyhow::Error {
    for error in errors.iter() {
        eprintln!("  {}: {}", error.path, error.message);
    }
    anyhow::anyhow!("{} invalid field(s)", errors.len())
}

fn report_sign_in(outcome: &SignInOutcome) -> Result<()> {
    match (&outcome.step, outcome.session.user()) {
        (SignInStep::Done, Some(user)) => {
            println!("Signed in as {}", user.username);
            Ok(())
        }
        (SignInStep::ConfirmSignUp, _) => {
            bail!("Account is not confirmed yet. Run `hasha confirm` with your code.")
        }
        (step, _) => bail!("Sign in needs another step: {}", step.as_str()),
    }
}

pub async fn signup(
    app: &App,
    username: String,
    email: String,
    password: String,
    code: Option<String>,
) -> Result<()> {
    let input = SignUpInput {
        username,
        email,
        password,
    }
    .validate()
    .map_err(reject)?;

    let step = app
        .auth
        .sign_up(&input.username, &input.email, &input.password)
        .await?;

    match (step, code) {
        (SignUpStep::ConfirmSignUp { .. }, Some(code)) => {
            confirm_and_sign_in(app, &input.username, code).await
        }
        (SignUpStep::ConfirmSignUp { destination }, None) => {
            let to = destination.unwrap_or(input.email);
            println!("Verification code sent to {to}.");
            println!(
                "Run `hasha confirm --username {} --code <code>` to finish.",
                input.username
            );
            Ok(())
        }
        (step, _) => {
            println!("Signed up ({})", step.as_str());
            Ok(())
        }
    }
}

async fn confirm_and_sign_in(app: &App, username: &str, code: String) -> Result<()> {
    let code = ConfirmationInput { code }.validate().map_err(reject)?.code;
    let outcome = app.auth.confirm_sign_up(username, &code).await?;
    if outcome.next_step != SignUpStep::CompleteAutoSignIn {
        println!("Account confirmed.");
        return Ok(());
    }
    let signed_in = app.auth.auto_sign_in().await?;
    report_sign_in(&signed_in)
}

pub async fn confirm(
    app: &App,
    username: String,
    code: String,
    password: Option<String>,
) -> Result<()> {
    let code = ConfirmationInput { code }.validate().map_err(reject)?.code;
    app.auth.confirm_sign_up(&username, &code).await?;
    println!("Account confirmed.");

    if let Some(password) = password {
        let outcome = app.auth.sign_in(&username, &password).await?;
        report_sign_in(&outcome)?;
    }
    Ok(())
}

pub async fn login(app: &App, email: String, password: String) -> Result<()> {
    // Usernames are accepted too; only validate as an email when it looks like one.
    if email.contains('@') {
        SignInInput {
            email: email.clone(),
            password: password.clone(),
        }
        .validate()
        .map_err(reject)?;
    }
    let outcome = app.auth.sign_in(email.trim(), &password).await?;
    report_sign_in(&outcome)
}

pub async fn logout(app: &App) {
    let session = app.auth.resolve().await;
    app.auth.sign_out(&session).await;
    println!("Signed out.");
}

pub async fn whoami(app: &App) {
    let session = app.auth.resolve().await;
    match session.user() {
        Some(user) => println!("{} ({})", user.username, user.user_id),
        None => println!("Not signed in."),
    }
}
