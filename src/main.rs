use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

mod chart_renderer;
mod draw_config;
mod simulator;

fn main() {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "draw_config.json".to_string());
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));

    // read destinations, participants and the draw count from the JSON file
    let config = match draw_config::read_draw_config_from_json(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read {config_path}: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = simulator::validate(&config.destinations, &config.participants) {
        eprintln!("{e}");
        process::exit(2);
    }

    // one run per invocation, unseeded
    let mut rng = rand::rng();
    let result = simulator::run_simulation(
        &config.destinations,
        &config.participants,
        config.draws,
        &mut rng,
    );

    let total_draws = config.draws as u64 * config.participants.len() as u64;
    println!("Quick summary ({total_draws} total draws)");
    for p in &result.participants {
        match p.tally.top_pick() {
            Some((dest, count)) => println!("  {}'s top pick: {dest} ({count} picks)", p.name),
            None => println!("  {}'s top pick: none (no draws)", p.name),
        }
    }

    let colors = chart_renderer::color_map(&config.destinations);

    let overall_path = out_dir.join("overall.png");
    let overall_title = format!("Overall picks ({total_draws} total draws)");
    match chart_renderer::render_tally_chart(
        &overall_title,
        &result.overall.sorted_desc(),
        &colors,
        &overall_path,
    ) {
        Ok(()) => println!("Overall chart written to {}", overall_path.display()),
        Err(e) => eprintln!("Failed to render overall chart: {e}"),
    }

    // repeated participant labels get the slot number appended so neither
    // chart overwrites the other
    let mut seen: HashMap<&str, u32> = HashMap::new();
    for p in &result.participants {
        let slot = seen
            .entry(p.name.as_str())
            .and_modify(|count| *count += 1)
            .or_insert(1);
        let suffix = if *slot > 1 { format!("_{slot}") } else { String::new() };
        let chart_path = out_dir.join(format!("picks_{}{suffix}.png", file_stem(&p.name)));
        match chart_renderer::render_tally_chart(&p.name, &p.tally.sorted_desc(), &colors, &chart_path) {
            Ok(()) => println!("Chart for {} written to {}", p.name, chart_path.display()),
            Err(e) => eprintln!("Failed to render chart for {}: {e}", p.name),
        }
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
