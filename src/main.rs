#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io::prelude::*;
use std::path::PathBuf;

use anyhow::{Context, Result};
use env_logger::Builder;
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use wmf2svg_wmf::ConvertOptions;

mod identify;
mod menu;
use menu::Modules;

fn color_level(level: Level) -> String {
    match level {
        Level::Error => level.red().to_string(),
        Level::Warn => level.yellow().to_string(),
        Level::Info => level.green().to_string(),
        Level::Debug => level.blue().to_string(),
        Level::Trace => level.purple().to_string(),
    }
}

const fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        //default to off
        _ => LevelFilter::Off,
    }
}

fn main() -> Result<()> {
    //Parse command line input
    let args: menu::Wmf2Svg = argp::parse_args_or_exit(argp::DEFAULT);

    // Build up a logger with custom formatting and set it to the verbosity from the command line args
    if args.verbose != 0 {
        Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {} {}",
                    wmf2svg_core::time::current_time(),
                    color_level(record.level()),
                    record.args()
                )
            })
            .filter(None, level_filter(args.verbose))
            .init();
    }

    match args.nested {
        Modules::IdentifyFile(params) => {
            crate::identify::identify_file(&params.input, params.deep_scan);
        }
        Modules::Convert(params) => {
            log::info!("Reading file {}", &params.input);
            let data = std::fs::read(&params.input)
                .with_context(|| format!("unable to read {}", params.input))?;

            let options = ConvertOptions {
                name_space: params.namespace,
                verbose: args.verbose != 0,
                svg_delimiter: !params.no_delimiter,
                img_width: params.width,
                img_height: params.height,
            };

            let svg = wmf2svg_wmf::convert(&data, &options)
                .with_context(|| format!("unable to convert {}", params.input))?;

            let output = params.output.map_or_else(
                || {
                    let mut new_path = PathBuf::from(&params.input);
                    new_path.set_extension("svg");
                    new_path.to_string_lossy().into_owned()
                },
                |output| output,
            );

            log::info!("Writing file {output}");
            std::fs::write(&output, svg).with_context(|| format!("unable to write {output}"))?;
        }
    }
    Ok(())
}
