use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, ensure, Context, Result};
use clap::{App, ArgMatches};

use pipeline::{FrameConfig, GeometryKind, ProgramSource};

pub enum Command {
    Run(FrameConfig),
    Check(FrameConfig),
}

pub struct Options {
    pub log_filter: Option<String>,
    pub command: Command,
}

/// Parses the process arguments. `--help`, `--version` and clap's own usage errors exit here.
pub fn parse() -> Result<Options> {
    let yaml = load_yaml!("cli.yaml");
    let matches = App::from_yaml(yaml).get_matches();

    options(&matches)
}

pub fn options(matches: &ArgMatches) -> Result<Options> {
    let config = frame_config(matches)?;
    let command = if matches.subcommand_matches("check").is_some() {
        Command::Check(config)
    } else {
        Command::Run(config)
    };

    Ok(Options { log_filter: matches.value_of("log").map(String::from), command })
}

pub fn frame_config(matches: &ArgMatches) -> Result<FrameConfig> {
    let defaults = FrameConfig::default();

    let width: u32 = parse_value(matches, "width")?;
    let height: u32 = parse_value(matches, "height")?;
    ensure!(width > 0 && height > 0, "window size must not be zero, got {}x{}", width, height);

    let geometry = match matches.value_of("geometry") {
        Some(name) => GeometryKind::from_name(name).ok_or_else(|| anyhow!("unknown geometry {:?}", name))?,
        None => defaults.geometry,
    };

    let clear_color = match matches.value_of("clear-color") {
        Some(color) => parse_color(color)?,
        None => defaults.clear_color,
    };

    Ok(FrameConfig {
        width,
        height,
        title: matches.value_of("title").map(String::from).unwrap_or(defaults.title),
        clear_color,
        geometry,
        programs: programs(matches, geometry),
    })
}

fn programs(matches: &ArgMatches, geometry: GeometryKind) -> Vec<ProgramSource> {
    let defaults = FrameConfig::default_programs(geometry);
    let vertex = matches.value_of("vert").map(PathBuf::from);

    match matches.values_of("frag") {
        Some(fragments) => {
            // Every default program of a geometry shares one vertex shader.
            let vertex = vertex.unwrap_or_else(|| defaults[0].vertex.clone());
            fragments.map(|fragment| ProgramSource::new(vertex.clone(), fragment)).collect()
        }
        None => match vertex {
            Some(vertex) => defaults
                .into_iter()
                .map(|source| ProgramSource::new(vertex.clone(), source.fragment))
                .collect(),
            None => defaults,
        },
    }
}

fn parse_value<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = matches.value_of(name).ok_or_else(|| anyhow!("missing --{}", name))?;
    raw.parse().with_context(|| format!("invalid --{} value {:?}", name, raw))
}

fn parse_color(raw: &str) -> Result<[f32; 4]> {
    let components = raw
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid color {:?}", raw))?;

    ensure!(components.len() == 4, "color {:?} needs 4 components, got {}", raw, components.len());
    ensure!(
        components.iter().all(|c| (0.0..=1.0).contains(c)),
        "color components of {:?} must be between 0 and 1",
        raw
    );

    Ok([components[0], components[1], components[2], components[3]])
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(args: &[&str]) -> Result<FrameConfig> {
        let yaml = load_yaml!("cli.yaml");
        let matches = App::from_yaml(yaml)
            .get_matches_from_safe(std::iter::once("gltoy").chain(args.iter().cloned()))
            .map_err(|e| anyhow!(e.message))?;
        frame_config(&matches)
    }

    #[test]
    fn no_arguments_gives_the_default_config() {
        assert_eq!(config(&[]).unwrap(), FrameConfig::default());
    }

    #[test]
    fn window_options_are_parsed() {
        let config = config(&["--width", "800", "--height", "450", "--title", "rays"]).unwrap();

        assert_eq!(config.width, 800);
        assert_eq!(config.height, 450);
        assert_eq!(config.title, "rays");
    }

    #[test]
    fn each_fragment_shader_becomes_a_program() {
        let config = config(&["--vert", "a.vert", "-f", "one.frag", "-f", "two.frag"]).unwrap();

        assert_eq!(
            config.programs,
            vec![ProgramSource::new("a.vert", "one.frag"), ProgramSource::new("a.vert", "two.frag")]
        );
    }

    #[test]
    fn triangle_geometry_has_its_own_default_shaders() {
        let config = config(&["--geometry", "triangle"]).unwrap();

        assert_eq!(config.geometry, GeometryKind::Triangle);
        assert_eq!(config.programs, FrameConfig::default_programs(GeometryKind::Triangle));
    }

    #[test]
    fn fragment_only_uses_the_geometry_vertex_shader() {
        let config = config(&["-f", "mine.frag"]).unwrap();

        assert_eq!(config.programs, vec![ProgramSource::new("shaders/default.vert", "mine.frag")]);
    }

    #[test]
    fn clear_color_is_validated() {
        assert_eq!(config(&["--clear-color", "0, 0.5, 1, 1"]).unwrap().clear_color, [0.0, 0.5, 1.0, 1.0]);
        assert!(config(&["--clear-color", "0,0,0"]).is_err());
        assert!(config(&["--clear-color", "2,0,0,1"]).is_err());
        assert!(config(&["--clear-color", "red"]).is_err());
    }

    #[test]
    fn check_subcommand_keeps_the_shader_options() {
        let yaml = load_yaml!("cli.yaml");
        let matches = App::from_yaml(yaml)
            .get_matches_from_safe(vec!["gltoy", "--log", "debug", "-f", "x.frag", "check"])
            .unwrap();

        let options = options(&matches).unwrap();

        assert_eq!(options.log_filter.as_deref(), Some("debug"));
        match options.command {
            Command::Check(config) => assert_eq!(config.programs[0].fragment, PathBuf::from("x.frag")),
            Command::Run(_) => panic!("expected the check subcommand"),
        }
    }

    #[test]
    fn bad_sizes_are_rejected() {
        assert!(config(&["--width", "0"]).is_err());
        assert!(config(&["--height", "tall"]).is_err());
        assert!(config(&["--geometry", "cube"]).is_err());
    }
}
