//! Bearing CLI - personal planning with themes, OKRs, and a versioned task board.

use bearing::cli::{
    CalendarCommands, Cli, Commands, ConfigCommands, KeyResultCommands, NavCommands,
    ObjectiveCommands, TaskCommands, ThemeCommands,
};
use bearing::commands::{
    self, NavArgs, Output, TaskCreateArgs, TaskFilter, TaskUpdateArgs, open_manager,
};
use bearing::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use bearing::logging::init_logging;
use bearing::storage::resolve_data_dir;
use clap::Parser;
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Until config is resolved only the flag decides the error format
    let mut human = cli.human_readable;

    let result = resolve_data_dir(cli.data_dir.as_deref()).and_then(|data_dir| {
        let mut overrides = ConfigOverrides::new();
        if cli.human_readable {
            overrides = overrides.with_output_format(OutputFormat::Human);
        }
        if let Some(level) = cli.log_level.as_deref() {
            overrides = overrides.with_log_level(level);
        }
        if let Some(limit) = cli.wip_limit {
            overrides = overrides.with_doing_wip_limit(limit);
        }

        let config = resolve_config(&data_dir, &overrides)?;
        human = config.output_format() == OutputFormat::Human;
        init_logging(config.log_level());
        tracing::debug!("data directory: {}", data_dir.display());

        run_command(cli.command, &data_dir, &config, human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn run_command(
    command: Commands,
    data_dir: &Path,
    config: &ResolvedConfig,
    human: bool,
) -> Result<(), bearing::Error> {
    match command {
        Commands::Init => {
            let result = commands::init(data_dir, config)?;
            output(&result, human);
        }

        Commands::Theme { command } => {
            let manager = open_manager(data_dir, config)?;
            match command {
                ThemeCommands::List => output(&commands::theme_list(&manager)?, human),
                ThemeCommands::Show { id } => output(&commands::theme_show(&manager, &id)?, human),
                ThemeCommands::Create { name, color, id } => {
                    let result = commands::theme_create(&manager, &name, &color, id.as_deref())?;
                    output(&result, human);
                }
                ThemeCommands::Update { id, name, color } => {
                    let result = commands::theme_update(
                        &manager,
                        &id,
                        name.as_deref(),
                        color.as_deref(),
                    )?;
                    output(&result, human);
                }
                ThemeCommands::Save { file } => {
                    output(&commands::theme_save(&manager, &file)?, human)
                }
                ThemeCommands::Delete { id } => {
                    output(&commands::theme_delete(&manager, &id)?, human)
                }
                ThemeCommands::Suggest { name } => {
                    output(&commands::theme_suggest(&manager, &name)?, human)
                }
            }
        }

        Commands::Objective { command } => {
            let manager = open_manager(data_dir, config)?;
            match command {
                ObjectiveCommands::Create { parent, title } => {
                    output(&commands::objective_create(&manager, &parent, &title)?, human)
                }
                ObjectiveCommands::Update { id, title } => {
                    output(&commands::objective_update(&manager, &id, &title)?, human)
                }
                ObjectiveCommands::Delete { id } => {
                    output(&commands::objective_delete(&manager, &id)?, human)
                }
                ObjectiveCommands::Move { id, parent } => {
                    output(&commands::objective_move(&manager, &id, &parent)?, human)
                }
                ObjectiveCommands::Status { id, status } => {
                    output(&commands::objective_status(&manager, &id, &status)?, human)
                }
            }
        }

        Commands::Kr { command } => {
            let manager = open_manager(data_dir, config)?;
            match command {
                KeyResultCommands::Create {
                    objective,
                    description,
                    start,
                    target,
                } => {
                    let result =
                        commands::kr_create(&manager, &objective, &description, start, target)?;
                    output(&result, human);
                }
                KeyResultCommands::Update {
                    id,
                    description,
                    start,
                    target,
                } => {
                    let result =
                        commands::kr_update(&manager, &id, description.as_deref(), start, target)?;
                    output(&result, human);
                }
                KeyResultCommands::Progress { id, value } => {
                    output(&commands::kr_progress(&manager, &id, value)?, human)
                }
                KeyResultCommands::Delete { id } => {
                    output(&commands::kr_delete(&manager, &id)?, human)
                }
                KeyResultCommands::Status { id, status } => {
                    output(&commands::kr_status(&manager, &id, &status)?, human)
                }
            }
        }

        Commands::Task { command } => {
            let manager = open_manager(data_dir, config)?;
            run_task_command(command, &manager, human)?;
        }

        Commands::Board => {
            let manager = open_manager(data_dir, config)?;
            output(&commands::board(&manager), human);
        }

        Commands::Calendar { command } => {
            let manager = open_manager(data_dir, config)?;
            match command {
                CalendarCommands::Show { year } => {
                    output(&commands::calendar_show(&manager, year)?, human)
                }
                CalendarCommands::Set {
                    date,
                    theme,
                    text,
                    notes,
                } => {
                    let result = commands::calendar_set(&manager, &date, theme, text, notes)?;
                    output(&result, human);
                }
                CalendarCommands::Clear { date } => {
                    output(&commands::calendar_clear(&manager, &date)?, human)
                }
            }
        }

        Commands::Nav { command } => {
            let manager = open_manager(data_dir, config)?;
            match command {
                NavCommands::Show => output(&commands::nav_show(&manager)?, human),
                NavCommands::Set {
                    view,
                    item,
                    theme,
                    date,
                    show_completed,
                    show_archived,
                    expanded,
                } => {
                    let args = NavArgs {
                        view,
                        item,
                        theme,
                        date,
                        show_completed,
                        show_archived,
                        expanded,
                    };
                    output(&commands::nav_set(&manager, args)?, human);
                }
            }
        }

        Commands::History { limit } => {
            let manager = open_manager(data_dir, config)?;
            output(&commands::history(&manager, limit)?, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::List => output(&commands::config_list(config), human),
            ConfigCommands::Get { key } => output(&commands::config_get(config, &key)?, human),
            ConfigCommands::Set { key, value, system } => {
                let result = commands::config_set(data_dir, &key, &value, system)?;
                output(&result, human);
            }
        },

        Commands::Version => output(&commands::version(), human),
    }
    Ok(())
}

fn run_task_command(
    command: TaskCommands,
    manager: &bearing::PlanningManager,
    human: bool,
) -> Result<(), bearing::Error> {
    match command {
        TaskCommands::Create {
            title,
            theme,
            priority,
            description,
            day,
            due,
            promote_on,
            tag,
            parent,
        } => {
            let args = TaskCreateArgs {
                title,
                theme,
                priority,
                description,
                day,
                due,
                promote_on,
                tags: tag,
                parent,
            };
            output(&commands::task_create(manager, args)?, human);
        }
        TaskCommands::List { theme, status } => {
            let result = commands::task_list(manager, TaskFilter { theme, status })?;
            output(&result, human);
        }
        TaskCommands::Show { id } => output(&commands::task_show(manager, &id)?, human),
        TaskCommands::Update {
            id,
            title,
            description,
            priority,
            day,
            due,
            promote_on,
            tag,
            clear_tags,
            parent,
        } => {
            let args = TaskUpdateArgs {
                title,
                description,
                priority,
                day,
                due,
                promote_on,
                tags: tag,
                clear_tags,
                parent,
            };
            output(&commands::task_update(manager, &id, args)?, human);
        }
        TaskCommands::Move { id, status, order } => {
            output(&commands::task_move(manager, &id, &status, order)?, human)
        }
        TaskCommands::Delete { id } => output(&commands::task_delete(manager, &id)?, human),
        TaskCommands::Archive { id } => output(&commands::task_archive(manager, &id)?, human),
        TaskCommands::ArchiveDone => output(&commands::task_archive_done(manager)?, human),
        TaskCommands::Restore { id } => output(&commands::task_restore(manager, &id)?, human),
        TaskCommands::Reorder { zone, ids } => {
            output(&commands::task_reorder(manager, &zone, ids)?, human)
        }
        TaskCommands::Order => output(&commands::task_order(manager)?, human),
        TaskCommands::Promote { today } => {
            output(&commands::task_promote(manager, today)?, human)
        }
    }
    Ok(())
}

/// Output a result in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
