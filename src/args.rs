//! Command-line argument parsing.
//!
//! Global flags (`--debug`, `--config`, `--log`, `--help`, `--version`) may
//! appear anywhere. Everything else is the command and its arguments:
//!
//! ```text
//! mimicoach [OPTIONS] [COMMAND] [ARGS...]
//! ```
//!
//! Without a command the geofence daemon runs. Parse failures are reported with
//! a warning and turn into [`CliAction::ShowHelpDueToError`]; numbers are parsed
//! here, range checks happen in the commands.

/// Flags that apply to every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeCommand {
    Show,
    Set {
        latitude: f64,
        longitude: f64,
        address: Option<String>,
    },
    /// Use the current position from the location provider.
    Here,
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeofenceCommand {
    On,
    Off,
    Radius(f64),
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccountCommand {
    Register { email: String, name: String },
    Login { email: String },
    Logout,
    Whoami,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WordsCommand {
    List {
        search: Option<String>,
        category: Option<String>,
    },
    Add {
        english: String,
        japanese: String,
        category: String,
        pronunciation: Option<String>,
        difficulty: Option<String>,
    },
    Remove {
        id: String,
    },
    Review {
        id: String,
        mastery: i32,
    },
    Today,
    Seed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SongsCommand {
    List,
    Today,
    Play { id: String },
    Seed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsCommand {
    Show,
    Set { key: String, value: String },
}

/// What the process should do.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Run the geofence daemon.
    Run,
    Home(HomeCommand),
    Geofence(GeofenceCommand),
    /// One-off proximity check of a coordinate against the stored home.
    Check {
        latitude: f64,
        longitude: f64,
    },
    Account(AccountCommand),
    Words(WordsCommand),
    Songs(SongsCommand),
    Speak {
        text: String,
    },
    /// Feed a recorded track through the trigger.
    Simulate {
        track: String,
    },
    Settings(SettingsCommand),

    ShowHelp,
    ShowVersion,
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub action: CliAction,
    pub options: GlobalOptions,
}

impl ParsedArgs {
    /// Parse an argument list whose first element is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut options = GlobalOptions::default();
        let mut display_help = false;
        let mut display_version = false;
        let mut invalid = false;
        let mut rest: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => options.debug_enabled = true,
                "--config" | "-c" | "--log" | "-l" => {
                    match args_vec.get(i + 1).filter(|value| !is_flag(value)) {
                        Some(value) => {
                            if matches!(arg, "--config" | "-c") {
                                options.config_dir = Some(value.clone());
                            } else {
                                options.log_file = Some(value.clone());
                            }
                            i += 1;
                        }
                        None => {
                            log_warning!("Missing value for {arg}. Usage: {arg} <path>");
                            invalid = true;
                        }
                    }
                }
                _ => rest.push(args_vec[i].clone()),
            }
            i += 1;
        }

        let action = if display_version {
            CliAction::ShowVersion
        } else if display_help {
            CliAction::ShowHelp
        } else if invalid {
            CliAction::ShowHelpDueToError
        } else {
            match parse_command(&rest) {
                Ok(action) => action,
                Err(message) => {
                    log_warning!("{message}");
                    CliAction::ShowHelpDueToError
                }
            }
        };

        ParsedArgs { action, options }
    }

    /// Parse `std::env::args()`.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// `-x` / `--xyz`, but not a negative number such as `-33.8`.
fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && arg.parse::<f64>().is_err()
}

/// Positional arguments and `--name value` options of one command.
struct CommandArgs<'a> {
    positionals: Vec<&'a str>,
    options: Vec<(&'a str, &'a str)>,
}

impl<'a> CommandArgs<'a> {
    fn split(args: &'a [String], allowed: &[&str], usage: &str) -> Result<Self, String> {
        let mut positionals = Vec::new();
        let mut options = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if !is_flag(arg) {
                positionals.push(arg);
                i += 1;
                continue;
            }
            if !allowed.contains(&arg) {
                return Err(format!("Unknown option: {arg}. Usage: {usage}"));
            }
            let Some(value) = args.get(i + 1).filter(|value| !is_flag(value)) else {
                return Err(format!("Missing value for {arg}. Usage: {usage}"));
            };
            options.push((arg, value.as_str()));
            i += 2;
        }

        Ok(Self {
            positionals,
            options,
        })
    }

    fn option(&self, name: &str) -> Option<String> {
        self.options
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str, usage: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {what}: '{value}'. Usage: {usage}"))
}

fn parse_command(rest: &[String]) -> Result<CliAction, String> {
    let Some((command, args)) = rest.split_first() else {
        return Ok(CliAction::Run);
    };

    match command.as_str() {
        "run" => {
            if let Some(extra) = args.first() {
                return Err(format!("Unexpected argument for run: {extra}"));
            }
            Ok(CliAction::Run)
        }
        "home" => parse_home(args).map(CliAction::Home),
        "geofence" => parse_geofence(args).map(CliAction::Geofence),
        "check" => {
            const USAGE: &str = "mimicoach check <latitude> <longitude>";
            let parsed = CommandArgs::split(args, &[], USAGE)?;
            match parsed.positionals.as_slice() {
                [lat, lon] => Ok(CliAction::Check {
                    latitude: parse_number(lat, "latitude", USAGE)?,
                    longitude: parse_number(lon, "longitude", USAGE)?,
                }),
                _ => Err(format!("Usage: {USAGE}")),
            }
        }
        "account" => parse_account(args).map(CliAction::Account),
        "words" => parse_words(args).map(CliAction::Words),
        "songs" => parse_songs(args).map(CliAction::Songs),
        "speak" => {
            const USAGE: &str = "mimicoach speak <text>";
            let parsed = CommandArgs::split(args, &[], USAGE)?;
            if parsed.positionals.is_empty() {
                return Err(format!("Missing text. Usage: {USAGE}"));
            }
            Ok(CliAction::Speak {
                text: parsed.positionals.join(" "),
            })
        }
        "simulate" => {
            const USAGE: &str = "mimicoach simulate <track.jsonl>";
            let parsed = CommandArgs::split(args, &[], USAGE)?;
            match parsed.positionals.as_slice() {
                [track] => Ok(CliAction::Simulate {
                    track: track.to_string(),
                }),
                _ => Err(format!("Usage: {USAGE}")),
            }
        }
        "settings" => parse_settings(args).map(CliAction::Settings),
        other => Err(format!("Unknown command: {other}")),
    }
}

fn parse_home(args: &[String]) -> Result<HomeCommand, String> {
    const USAGE: &str = "mimicoach home [show | set <lat> <lon> [address] | here | clear]";
    let parsed = CommandArgs::split(args, &[], USAGE)?;

    match parsed.positionals.as_slice() {
        [] | ["show"] => Ok(HomeCommand::Show),
        ["set", lat, lon, address @ ..] => Ok(HomeCommand::Set {
            latitude: parse_number(lat, "latitude", USAGE)?,
            longitude: parse_number(lon, "longitude", USAGE)?,
            address: (!address.is_empty()).then(|| address.join(" ")),
        }),
        ["here"] => Ok(HomeCommand::Here),
        ["clear"] => Ok(HomeCommand::Clear),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

fn parse_geofence(args: &[String]) -> Result<GeofenceCommand, String> {
    const USAGE: &str = "mimicoach geofence [on | off | radius <meters> | status]";
    let parsed = CommandArgs::split(args, &[], USAGE)?;

    match parsed.positionals.as_slice() {
        [] | ["status"] => Ok(GeofenceCommand::Status),
        ["on"] => Ok(GeofenceCommand::On),
        ["off"] => Ok(GeofenceCommand::Off),
        ["radius", meters] => Ok(GeofenceCommand::Radius(parse_number(
            meters, "radius", USAGE,
        )?)),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

fn parse_account(args: &[String]) -> Result<AccountCommand, String> {
    const USAGE: &str = "mimicoach account [register <email> <name> | login <email> | logout | whoami]";
    let parsed = CommandArgs::split(args, &[], USAGE)?;

    match parsed.positionals.as_slice() {
        ["register", email, name @ ..] => Ok(AccountCommand::Register {
            email: email.to_string(),
            name: name.join(" "),
        }),
        ["login", email] => Ok(AccountCommand::Login {
            email: email.to_string(),
        }),
        ["logout"] => Ok(AccountCommand::Logout),
        [] | ["whoami"] => Ok(AccountCommand::Whoami),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

fn parse_words(args: &[String]) -> Result<WordsCommand, String> {
    const USAGE: &str = "mimicoach words [list [--search <term>] [--category <name>] | \
                         add <english> <japanese> <category> [--pronunciation <text>] [--difficulty <level>] | \
                         remove <id> | review <id> <mastery> | today | seed]";
    let parsed = CommandArgs::split(
        args,
        &["--search", "--category", "--pronunciation", "--difficulty"],
        USAGE,
    )?;

    let command = match parsed.positionals.as_slice() {
        [] | ["list"] => WordsCommand::List {
            search: parsed.option("--search"),
            category: parsed.option("--category"),
        },
        ["add", english, japanese, category] => WordsCommand::Add {
            english: english.to_string(),
            japanese: japanese.to_string(),
            category: category.to_string(),
            pronunciation: parsed.option("--pronunciation"),
            difficulty: parsed.option("--difficulty"),
        },
        ["remove", id] => WordsCommand::Remove { id: id.to_string() },
        ["review", id, mastery] => WordsCommand::Review {
            id: id.to_string(),
            mastery: parse_number(mastery, "mastery level", USAGE)?,
        },
        ["today"] => WordsCommand::Today,
        ["seed"] => WordsCommand::Seed,
        _ => return Err(format!("Usage: {USAGE}")),
    };

    // Options only make sense for the subcommand that reads them
    let accepted: &[&str] = match command {
        WordsCommand::List { .. } => &["--search", "--category"],
        WordsCommand::Add { .. } => &["--pronunciation", "--difficulty"],
        _ => &[],
    };
    if let Some((name, _)) = parsed
        .options
        .iter()
        .find(|(name, _)| !accepted.contains(name))
    {
        return Err(format!("Unknown option: {name}. Usage: {USAGE}"));
    }

    Ok(command)
}

fn parse_songs(args: &[String]) -> Result<SongsCommand, String> {
    const USAGE: &str = "mimicoach songs [list | today | play <id> | seed]";
    let parsed = CommandArgs::split(args, &[], USAGE)?;

    match parsed.positionals.as_slice() {
        [] | ["list"] => Ok(SongsCommand::List),
        ["today"] => Ok(SongsCommand::Today),
        ["play", id] => Ok(SongsCommand::Play { id: id.to_string() }),
        ["seed"] => Ok(SongsCommand::Seed),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

fn parse_settings(args: &[String]) -> Result<SettingsCommand, String> {
    const USAGE: &str = "mimicoach settings [show | set <key> <value>]";
    let parsed = CommandArgs::split(args, &[], USAGE)?;

    match parsed.positionals.as_slice() {
        [] | ["show"] => Ok(SettingsCommand::Show),
        ["set", key, value] => Ok(SettingsCommand::Set {
            key: key.to_string(),
            value: value.to_string(),
        }),
        _ => Err(format!("Usage: {USAGE}")),
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("mimicoach [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-l, --log <file>       Write output to a file instead of the terminal");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("run                    Watch the home geofence (default)");
    log_indented!("home                   show | set <lat> <lon> [address] | here | clear");
    log_indented!("geofence               on | off | radius <meters> | status");
    log_indented!("check <lat> <lon>      Check a position against the home geofence");
    log_indented!("account                register <email> <name> | login <email> | logout | whoami");
    log_indented!("words                  list | add | remove <id> | review <id> <mastery> | today | seed");
    log_indented!("songs                  list | today | play <id> | seed");
    log_indented!("speak <text>           Pronounce a word or phrase");
    log_indented!("simulate <track>       Replay a recorded track through the geofence");
    log_indented!("settings               show | set <key> <value>");
    log_end!();
}
