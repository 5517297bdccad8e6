//! Headless mode: the session over stdin/stdout, no terminal UI.
//!
//! Lines starting with `#` are commands; anything else is sent as a chat
//! message. Replies are printed with the speaker's name; session notes and
//! errors come out as `[system]` lines.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chronochat_core::auth::{self, AuthError};
use chronochat_core::storage::KvStore;
use chronochat_core::{capsule, export, ChatMode, ChatSession, LineKind, SessionError, TargetKind};

/// Run the line protocol until stdin closes or `#quit`.
pub async fn run_headless(
    mut session: ChatSession,
    mut store: KvStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut logged_in = auth::is_logged_in(&store);
    let mut printed = 0usize;

    println!("[system] ChronoChat headless. Commands start with '#'; everything else is chat.");
    if logged_in {
        println!("[system] Choose a mode with #mode <learn|dm|group>. #quit to exit.");
    } else {
        println!("[system] Log in with: #login <user> <pass>");
    }
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(rest) = input.strip_prefix('#') {
            let mut parts = rest.split_whitespace();
            let cmd = parts.next().unwrap_or("");
            match cmd {
                "quit" | "exit" => break,
                "capsule" => match capsule::todays_capsule(&mut store).await {
                    Ok(prompt) => println!("[system] Today's time capsule: {prompt}"),
                    Err(e) => println!("[system] Could not load the time capsule: {e}"),
                },
                "login" => {
                    let user = parts.next().unwrap_or("");
                    let pass = parts.next().unwrap_or("");
                    match auth::login(&mut store, user, pass).await {
                        Ok(()) => {
                            logged_in = true;
                            println!(
                                "[system] Logged in. Choose a mode with #mode <learn|dm|group>."
                            );
                        }
                        Err(AuthError::InvalidCredentials) => {
                            println!("[system] {}", auth::LOGIN_FAILED_MESSAGE);
                        }
                        Err(e) => println!("[system] Could not save your login: {e}"),
                    }
                }
                _ if !logged_in => {
                    println!("[system] Please log in first: #login <user> <pass>");
                }
                "logout" => {
                    if let Err(e) = auth::logout(&mut store).await {
                        println!("[system] Could not clear your login: {e}");
                    } else {
                        logged_in = false;
                        session.go_back();
                        printed = 0;
                        println!("[system] Logged out.");
                    }
                }
                "modes" => {
                    println!("[system] learn - one-on-one with an AI guide or persona");
                    println!("[system] dm - direct messages, including in-era characters");
                    println!("[system] group - the shared era group chat");
                }
                "mode" => match parts.next().and_then(ChatMode::parse) {
                    Some(mode) => {
                        printed = 0;
                        session.choose_mode(mode);
                        print_status(&session);
                    }
                    None => println!("[system] Usage: #mode <learn|dm|group>"),
                },
                "eras" => {
                    for era in session.catalog().eras() {
                        println!("[system] {} - {}", era.id, era.name);
                    }
                }
                "era" => match parts.next() {
                    Some(era_id) => {
                        printed = 0;
                        let _ = session.choose_era(era_id);
                        print_status(&session);
                    }
                    None => println!("[system] Usage: #era <id>"),
                },
                "roles" => match session.current_era() {
                    Some(era) => {
                        for role in &era.roles {
                            println!("[system] {} - {} ({})", role.id, role.name, role.description);
                        }
                    }
                    None => println!("[system] Choose a destination first: #era <id>"),
                },
                "role" => match parts.next() {
                    Some(role_id) => {
                        printed = 0;
                        let _ = session.choose_role(role_id).await;
                        print_status(&session);
                    }
                    None => println!("[system] Usage: #role <id>"),
                },
                "targets" => {
                    let targets = session.offered_targets();
                    if targets.is_empty() {
                        if session.state().mode() == Some(ChatMode::Group) {
                            println!(
                                "[system] Group mode needs no counterpart. Choose a role to \
                                 enter the chat."
                            );
                        } else {
                            println!(
                                "[system] No counterparts here yet. Choose a destination and \
                                 role first."
                            );
                        }
                    }
                    for target in targets {
                        let kind = match target.kind {
                            TargetKind::Ai => "ai",
                            TargetKind::Mock => "mock",
                        };
                        println!("[system] {} {} - {}", kind, target.id, target.label);
                    }
                }
                "target" => {
                    let kind = match parts.next() {
                        Some("ai") => Some(TargetKind::Ai),
                        Some("mock") => Some(TargetKind::Mock),
                        _ => None,
                    };
                    match (kind, parts.next()) {
                        (Some(kind), Some(id)) => {
                            printed = 0;
                            let _ = session.choose_target(kind, id).await;
                            print_status(&session);
                        }
                        _ => println!("[system] Usage: #target <ai|mock> <id>"),
                    }
                }
                "back" => {
                    printed = 0;
                    session.go_back();
                    println!("[system] Starting over. Choose a mode with #mode <learn|dm|group>.");
                }
                "status" => print_status(&session),
                "snapshot" => match session.take_snapshot().await {
                    Ok(snapshot) => {
                        println!("[system] {}", snapshot.title);
                        println!("[system] Saved to {}", snapshot.path.display());
                        println!("[system] {}", snapshot.share_line);
                    }
                    Err(_) => {
                        // The feed carries the user-facing failure text.
                    }
                },
                "export" => {
                    let path = parts
                        .next()
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from("chronochat-transcript.html"));
                    match export::write_html(&path, &export_title(&session), session.lines()).await
                    {
                        Ok(()) => println!("[system] Transcript exported to {}", path.display()),
                        Err(e) => println!("[system] Export failed: {e}"),
                    }
                }
                other => println!("[system] Unknown command: #{other}"),
            }
        } else if !logged_in {
            println!("[system] Please log in first: #login <user> <pass>");
        } else if let Err(e) = session.send_message(input).await {
            if matches!(e, SessionError::NotInitialized) {
                print_status(&session);
            }
        }

        printed = print_new_lines(&session, printed);
        io::stdout().flush()?;
    }

    Ok(())
}

/// Print feed lines added since the last call, returning the new mark.
fn print_new_lines(session: &ChatSession, printed: usize) -> usize {
    let lines = session.lines();
    for line in &lines[printed.min(lines.len())..] {
        match line.kind {
            LineKind::System => println!("[system] {}", line.text),
            _ => println!("{}: {}", line.sender, line.text),
        }
    }
    lines.len()
}

fn print_status(session: &ChatSession) {
    let status = session.status();
    if status.is_empty() {
        println!("[system] Choose a mode with #mode <learn|dm|group>.");
    } else {
        println!("[system] {status}");
    }
}

fn export_title(session: &ChatSession) -> String {
    match session.current_era() {
        Some(era) => format!("ChronoChat Transcript - {}", era.name),
        None => "ChronoChat Transcript".to_string(),
    }
}
