//! A small CLI for voters: list elections, inspect one, cast a vote, and
//! check whether the configured account has voted already.
//! This talks to the same contract as the gateway and reads the same
//! `Rocket.toml` / `ROCKET_*` configuration, so one config serves both.

use std::fmt::{Display, Formatter};

use chrono::{TimeZone, Utc};
use clap::{Arg, ArgMatches, Command};
use rocket::futures::future::try_join_all;

use elections_gateway::config::Config;
use elections_gateway::model::election::{CandidateId, ElectionId, ElectionView};
use elections_gateway::model::pagination::PaginationRequest;
use elections_gateway::near::{ElectionsContract, NearContract};

const PROGRAM_NAME: &str = "voter-cli";

const ABOUT_TEXT: &str = "Query elections and cast votes as the configured account.

EXIT CODES:
     0: Success.
     1: Configuration, usage or remote error.";

const LIST: &str = "list";
const SHOW: &str = "show";
const VOTE: &str = "vote";
const HAVE_VOTED: &str = "have-voted";

const PAGE: &str = "PAGE";
const PAGE_SIZE: &str = "PAGE_SIZE";
const ELECTION_ID: &str = "ELECTION_ID";
const CANDIDATE: &str = "CANDIDATE";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    let election_id_arg = Arg::new(ELECTION_ID)
        .help("The election's ID, as listed by `list`")
        .required(true);

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new(LIST)
                .about("List the organization's elections page by page")
                .arg(
                    Arg::new(PAGE)
                        .long("page")
                        .help("1-based page number")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("1"),
                )
                .arg(
                    Arg::new(PAGE_SIZE)
                        .long("page-size")
                        .help("Elections per page")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                ),
        )
        .subcommand(
            Command::new(SHOW)
                .about("Show one election with its current tallies")
                .arg(election_id_arg.clone()),
        )
        .subcommand(
            Command::new(VOTE)
                .about("Vote for a candidate by ballot position")
                .arg(election_id_arg.clone())
                .arg(
                    Arg::new(CANDIDATE)
                        .help("The candidate's ballot position, as shown by `show`")
                        .value_parser(clap::value_parser!(u8))
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(HAVE_VOTED)
                .about("Check whether this account has voted in an election")
                .arg(election_id_arg),
        )
}

/// Errors that this program may produce.
#[derive(Debug)]
enum Error {
    /// The figment configuration was missing or invalid.
    Config(String),
    /// Bad command-line input that clap could not catch.
    Usage(String),
    /// A remote call failed.
    Remote(elections_gateway::error::Error),
}

/// One line of `list` output.
struct ElectionLine<'a> {
    id: ElectionId,
    election: &'a ElectionView,
}

impl Display for ElectionLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let total: u128 = self.election.candidates.iter().map(|c| c.votes).sum();
        write!(
            f,
            "#{} {} ({} candidates, {} vote{}) open {} to {}",
            self.id,
            self.election.title,
            self.election.candidates.len(),
            total,
            if total != 1 { "s" } else { "" },
            format_time(self.election.start),
            format_time(self.election.end),
        )
    }
}

/// Render a nanosecond timestamp for humans.
fn format_time(nanos: u64) -> String {
    Utc.timestamp_nanos(nanos as i64)
        .format("%Y-%m-%d %H:%M UTC")
        .to_string()
}

/// Election IDs exceed u64, so clap's ranged parsers don't cover them.
fn parse_election_id(args: &ArgMatches) -> Result<ElectionId, Error> {
    let raw: &String = args.get_one(ELECTION_ID).unwrap(); // Required argument is guaranteed to be present.
    raw.parse()
        .map_err(|_| Error::Usage(format!("'{raw}' is not an election ID")))
}

async fn list(contract: &NearContract, args: &ArgMatches) -> Result<(), Error> {
    let page_num = *args.get_one::<u64>(PAGE).unwrap();
    let page_size = *args.get_one::<u64>(PAGE_SIZE).unwrap();
    // Both are range-validated by clap, so the request is always valid.
    let pagination = PaginationRequest::new(page_num, page_size).unwrap();

    let elements_count = contract.elections_count().await.map_err(Error::Remote)?;
    let bounds = pagination.bounds(elements_count);
    let elections = try_join_all(
        (0..bounds.length).map(|offset| contract.get_election(bounds.start + u128::from(offset))),
    )
    .await
    .map_err(Error::Remote)?;

    if elections.is_empty() {
        println!("No elections on page {page_num} of {}.", bounds.page_count);
        return Ok(());
    }
    println!(
        "Page {page_num} of {} ({elements_count} election{} in total)",
        bounds.page_count,
        if elements_count != 1 { "s" } else { "" },
    );
    for (offset, election) in elections.iter().enumerate() {
        println!(
            "{}",
            ElectionLine {
                id: bounds.start + offset as u128,
                election,
            }
        );
    }
    Ok(())
}

async fn show(contract: &NearContract, election_id: ElectionId) -> Result<(), Error> {
    let election = contract
        .get_election(election_id)
        .await
        .map_err(Error::Remote)?;
    println!("{} (#{election_id})", election.title);
    println!("{}", election.description);
    println!(
        "Open {} to {}",
        format_time(election.start),
        format_time(election.end)
    );
    for (position, candidate) in election.candidates.iter().enumerate() {
        println!(
            "  [{position}] {}: {} vote{}",
            candidate.name,
            candidate.votes,
            if candidate.votes != 1 { "s" } else { "" },
        );
    }
    Ok(())
}

async fn vote(
    contract: &NearContract,
    election_id: ElectionId,
    candidate_id: CandidateId,
) -> Result<(), Error> {
    contract
        .vote(election_id, candidate_id)
        .await
        .map_err(Error::Remote)?;
    println!("Vote cast for candidate {candidate_id} in election {election_id}.");
    Ok(())
}

async fn have_voted(contract: &NearContract, election_id: ElectionId) -> Result<(), Error> {
    let voted = contract
        .have_voted(election_id)
        .await
        .map_err(Error::Remote)?;
    if voted {
        println!("This account has already voted in election {election_id}.");
    } else {
        println!("This account has not voted in election {election_id} yet.");
    }
    Ok(())
}

async fn execute(args: &ArgMatches) -> Result<(), Error> {
    let config = rocket::Config::figment()
        .extract::<Config>()
        .map_err(|err| Error::Config(err.to_string()))?;
    let contract = NearContract::new(&config).map_err(Error::Remote)?;

    match args.subcommand() {
        Some((LIST, sub)) => list(&contract, sub).await,
        Some((SHOW, sub)) => show(&contract, parse_election_id(sub)?).await,
        Some((VOTE, sub)) => {
            let election_id = parse_election_id(sub)?;
            let candidate_id = *sub.get_one::<CandidateId>(CANDIDATE).unwrap();
            vote(&contract, election_id, candidate_id).await
        }
        Some((HAVE_VOTED, sub)) => have_voted(&contract, parse_election_id(sub)?).await,
        _ => unreachable!("a subcommand is required"),
    }
}

/// Run the requested command, report the result, and return the exit code.
async fn run(args: &ArgMatches) -> u8 {
    match execute(args).await {
        Ok(()) => 0,
        Err(Error::Config(msg)) => {
            println!("Configuration error: {msg}");
            1
        }
        Err(Error::Usage(msg)) => {
            println!("{msg}");
            1
        }
        Err(Error::Remote(err)) => {
            println!("{err}");
            1
        }
    }
}

#[rocket::main]
async fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args).await;
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_cli_usage() {
        let invocations: &[&[&str]] = &[
            &[PROGRAM_NAME, "list"],
            &[PROGRAM_NAME, "list", "--page", "2", "--page-size", "5"],
            &[PROGRAM_NAME, "show", "7"],
            &[PROGRAM_NAME, "vote", "7", "1"],
            &[PROGRAM_NAME, "have-voted", "7"],
        ];
        for command_line in invocations {
            cli().try_get_matches_from(command_line.iter().copied()).unwrap();
        }
    }

    #[test]
    fn bad_cli_usage() {
        let invocations: &[&[&str]] = &[
            // No subcommand at all.
            &[PROGRAM_NAME],
            // Pages are 1-based.
            &[PROGRAM_NAME, "list", "--page", "0"],
            &[PROGRAM_NAME, "list", "--page-size", "0"],
            // Candidate missing.
            &[PROGRAM_NAME, "vote", "7"],
            // Candidate positions are u8.
            &[PROGRAM_NAME, "vote", "7", "256"],
            &[PROGRAM_NAME, "nonsense"],
        ];
        for command_line in invocations {
            cli()
                .try_get_matches_from(command_line.iter().copied())
                .unwrap_err();
        }
    }

    #[test]
    fn election_ids_parse_to_full_width() {
        let max = u128::MAX.to_string();
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "show", max.as_str()])
            .unwrap();
        let (_, sub) = args.subcommand().unwrap();
        assert_eq!(parse_election_id(sub).unwrap(), u128::MAX);

        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "show", "12x"])
            .unwrap();
        let (_, sub) = args.subcommand().unwrap();
        assert!(matches!(parse_election_id(sub), Err(Error::Usage(_))));
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_time(1_700_000_000_000_000_000),
            "2023-11-14 22:13 UTC"
        );
    }
}
