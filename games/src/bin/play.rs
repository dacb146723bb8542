use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use clap::Parser;
use database::DatabaseConfig;
use games::{ContentLibrary, GameError, Registration, ServiceSettings, Services, StartedGame};
use itertools::Itertools;
use regex::Regex;
use types::{Difficulty, GameType, Tile};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Params {
    #[arg(short, long)]
    username: String,
    #[arg(short, long, default_value = "hanzi-quest")]
    password: String,
    #[arg(short, long, default_value = "idiom")]
    game: GameType,
    #[arg(short, long, default_value = "easy")]
    difficulty: Difficulty,
    #[arg(long)]
    database_url: Option<String>,
    /// YAML content library to play instead of the built-in one.
    #[arg(long)]
    content: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Hint,
    Abandon,
    Quit,
    Submit(Vec<Tile>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Params::parse();
    log::info!("args: {args:?}");

    let pool = DatabaseConfig::from_cli_or_env_or_yaml(args.database_url.clone(), None)
        .connect()
        .await
        .context("connecting to the database")?;
    let library = match &args.content {
        Some(path) => ContentLibrary::from_path(path)?,
        None => ContentLibrary::builtin()?,
    };
    let services = Services::new(pool, Arc::new(library), ServiceSettings::default());
    let player_id = find_or_register(&services, &args.username, &args.password).await?;
    let game = services.game(args.game);

    loop {
        let started = game.start_game(player_id, args.difficulty).await?;
        print_board(&started);

        let mut buf = String::new();
        let finished = loop {
            buf.clear();
            print!("Your move? >> ");
            let _ = io::stdout().flush();
            if io::stdin().read_line(&mut buf)? == 0 {
                game.abandon(started.session_id).await?;
                return Ok(());
            }
            let command = match parse_command(&buf, &started.tiles, args.game) {
                Ok(command) => command,
                Err(err) => {
                    log::error!("Could not understand that: {err}");
                    continue;
                }
            };
            match command {
                Command::Hint => match game.request_hint(started.session_id).await {
                    Ok(hint) => println!(
                        "Hint {} (-{} points, {} left): {}",
                        hint.level, hint.penalty, hint.hints_remaining, hint.hint
                    ),
                    Err(err @ GameError::MaxHintsExceeded(_)) => println!("{err}"),
                    Err(err) => return Err(err.into()),
                },
                Command::Abandon => {
                    game.abandon(started.session_id).await?;
                    println!("Puzzle abandoned.");
                    break false;
                }
                Command::Quit => {
                    game.abandon(started.session_id).await?;
                    return Ok(());
                }
                Command::Submit(tiles) => {
                    match game.submit_answer(started.session_id, tiles).await {
                        Ok(result) => {
                            println!(
                                "{} Answer: {} | score {} (base {} + bonus {} x{} - {}) | rank {}",
                                if result.correct { "Correct!" } else { "Not quite." },
                                result.correct_answer.join(separator(args.game)),
                                result.breakdown.total_score,
                                result.breakdown.base_points,
                                result.breakdown.time_bonus,
                                result.breakdown.difficulty_multiplier,
                                result.breakdown.hint_penalty,
                                result.leaderboard_rank
                            );
                            if !result.new_achievements.is_empty() {
                                println!(
                                    "Unlocked: {}",
                                    result.new_achievements.iter().join(", ")
                                );
                            }
                            break true;
                        }
                        Err(GameError::Validation(msg)) => println!("{msg}"),
                        Err(err) => return Err(err.into()),
                    }
                }
            }
        };
        log::debug!("Round over, finished={finished}");
    }
}

async fn find_or_register(
    services: &Services,
    username: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    match services.players.get_by_username(username).await {
        Ok(_) => Ok(services.players.login(username, password).await?.id),
        Err(GameError::PlayerNotFound(_)) => {
            let player = services
                .players
                .register(Registration {
                    username: username.to_string(),
                    email: format!("{username}@players.hanzi.local"),
                    password: password.to_string(),
                })
                .await?;
            println!("Welcome, {}! A new player was created.", player.username);
            Ok(player.id)
        }
        Err(err) => Err(err.into()),
    }
}

fn separator(game_type: GameType) -> &'static str {
    match game_type {
        GameType::Idiom => "",
        GameType::Sentence => " ",
    }
}

fn print_board(game: &StartedGame) {
    println!(
        "{} / {}: {} tiles, {}s limit, {} base points, {} hints",
        game.game_type,
        game.difficulty,
        game.tiles.len(),
        game.time_limit_secs,
        game.base_points,
        game.hints_remaining
    );
    println!(
        "Tiles: {}",
        game.tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| format!("[{}] {tile}", i + 1))
            .join("  ")
    );
    println!("Commands: hint | abandon | quit | order 3 1 2 4 | answer <tiles>");
}

fn parse_command(input: &str, tiles: &[Tile], game_type: GameType) -> Result<Command, String> {
    let input = input.trim();
    let lowered = input.to_lowercase();
    match lowered.as_str() {
        "hint" => return Ok(Command::Hint),
        "abandon" => return Ok(Command::Abandon),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    let order_re = Regex::new(r"^order\s+(?<positions>[\d\s,]+)$").expect("Valid order regex");
    if let Some(caps) = order_re.captures(&lowered) {
        let positions = caps["positions"]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>().map_err(|e| e.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        if positions.len() != tiles.len() || !positions.iter().all_unique() {
            return Err(format!("give each of the {} positions exactly once", tiles.len()));
        }
        return positions
            .into_iter()
            .map(|p| {
                p.checked_sub(1)
                    .and_then(|i| tiles.get(i))
                    .cloned()
                    .ok_or_else(|| format!("no tile at position {p}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Command::Submit);
    }

    let answer_re = Regex::new(r"^(?i:answer)\s+(?<tiles>.+)$").expect("Valid answer regex");
    if let Some(caps) = answer_re.captures(input) {
        let words = caps["tiles"].split_whitespace().map(String::from).collect_vec();
        // an idiom typed as one word is split into its characters
        let submitted = match (game_type, words.as_slice()) {
            (GameType::Idiom, [single]) => types::idiom_tiles(single),
            _ => words,
        };
        return Ok(Command::Submit(submitted));
    }

    Err(format!("unknown command {input:?}"))
}
