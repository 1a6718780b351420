use clap::Parser;
use fastfill_cli::cli::commands::Commands;
use fastfill_cli::cli::output::OutputFormat;
use fastfill_cli::cli::profiles::ProfilesAction;
use fastfill_cli::CliArgs;

#[test]
fn fill_accepts_target_flags_after_subcommand() {
    let cli = CliArgs::try_parse_from([
        "fastfill",
        "fill",
        "av",
        "--url",
        "https://www.irctc.co.in/nget/train-search",
        "--force",
        "--wait",
        "3",
    ])
    .unwrap();

    let Commands::Fill(args) = cli.command else {
        panic!("expected fill");
    };
    assert_eq!(args.profile, "av");
    assert_eq!(args.wait, 3);
    assert!(cli.target.force);
    assert_eq!(
        cli.target.url.as_ref().map(|url| url.host_str()),
        Some(Some("www.irctc.co.in"))
    );
}

#[test]
fn group_fill_and_output_format() {
    let cli = CliArgs::try_parse_from([
        "fastfill",
        "--output",
        "json",
        "fill-group",
        "Family Darshan",
        "--ws",
        "ws://127.0.0.1:9222/devtools/browser/abc",
    ])
    .unwrap();

    assert_eq!(cli.output, OutputFormat::Json);
    assert!(matches!(cli.command, Commands::FillGroup(ref args) if args.wait == 10));
    assert_eq!(
        cli.target.ws.as_deref(),
        Some("ws://127.0.0.1:9222/devtools/browser/abc")
    );
}

#[test]
fn profiles_show_takes_a_query() {
    let cli = CliArgs::try_parse_from(["fastfill", "profiles", "show", "fam"]).unwrap();
    let Commands::Profiles(args) = cli.command else {
        panic!("expected profiles");
    };
    assert!(matches!(args.action, ProfilesAction::Show { ref profile } if profile == "fam"));
}

#[test]
fn rejects_bad_urls_and_missing_profiles() {
    assert!(CliArgs::try_parse_from(["fastfill", "fill", "av", "--url", "not a url"]).is_err());
    assert!(CliArgs::try_parse_from(["fastfill", "fill"]).is_err());
    assert!(CliArgs::try_parse_from(["fastfill", "detect", "--output", "xml"]).is_err());
}
