// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn date_arg() -> Arg {
    Arg::new("date")
        .long("date")
        .help("Calendar date YYYY-MM-DD (defaults to today)")
}

pub fn build_cli() -> Command {
    Command::new("moneydrip")
        .version(crate_version!())
        .about("Automated recurring transfers into savings money boxes")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts and money boxes")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("primary")
                                .value_parser(["primary", "box"]),
                        )
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("balance").long("balance").default_value("0")),
                )
                .subcommand(
                    Command::new("deposit")
                        .about("Record an external deposit")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true)),
                )
                .subcommand(
                    Command::new("freeze")
                        .about("Freeze an account (transfers touching it fail)")
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(
                    Command::new("unfreeze")
                        .about("Unfreeze an account")
                        .arg(Arg::new("name").long("name").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List accounts with balances"),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Settings")
                .subcommand(
                    Command::new("currency")
                        .about("Show or set the default account currency")
                        .arg(Arg::new("code")),
                ),
        )
        .subcommand(
            Command::new("schedule")
                .about("Manage recurring transfer schedules")
                .subcommand(
                    Command::new("enable")
                        .about("Enable or change a monthly transfer for a pair")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("day")
                                .long("day")
                                .required(true)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(date_arg()),
                )
                .subcommand(
                    Command::new("disable")
                        .about("Disable a pair's transfer at the end of this month")
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true))
                        .arg(date_arg()),
                )
                .subcommand(
                    Command::new("teardown")
                        .about("Tombstone every schedule feeding a money box")
                        .arg(Arg::new("to").long("to").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List schedule versions")
                        .arg(Arg::new("from").long("from"))
                        .arg(Arg::new("to").long("to"))
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Include tombstoned versions"),
                        ),
                )),
        )
        .subcommand(
            Command::new("run")
                .about("Scheduled jobs (invoked by cron)")
                .subcommand(
                    Command::new("daily")
                        .about("Execute every schedule due today")
                        .arg(date_arg()),
                )
                .subcommand(
                    Command::new("wave")
                        .about("Retry failed executions at a given retry count")
                        .arg(
                            Arg::new("retry")
                                .long("retry")
                                .required(true)
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(date_arg()),
                )
                .subcommand(
                    Command::new("at")
                        .about("Run every job registered for a wall-clock time")
                        .arg(Arg::new("time").long("time").required(true))
                        .arg(date_arg()),
                )
                .subcommand(Command::new("crontab").about("Print cron lines for the cadence")),
        )
        .subcommand(
            Command::new("history")
                .about("Execution audit trail")
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List execution records")
                        .arg(Arg::new("date").long("date"))
                        .arg(
                            Arg::new("schedule")
                                .long("schedule")
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("status").long("status").value_parser([
                            "SUCCESS", "FAILED", "RETRY",
                        ]))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("export")
                        .about("Export execution records")
                        .arg(
                            Arg::new("format")
                                .long("format")
                                .default_value("csv")
                                .value_parser(["csv", "json"]),
                        )
                        .arg(Arg::new("out").long("out").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check invariants and data health"))
}
