use std::env;
use std::io::{self, Write};

use picky_mascot::core::world::{Engine, MascotCommand, Snapshot};
use picky_mascot::components::geometry::Rect;
use picky_mascot::simulation::library::MascotLibrary;
use picky_mascot::simulation::selection::SelectionMode;

const HELP: &str = "Commands: tick [n] | state | cursor <x> <y> | viewport <w> <h> | drag | move <x> <y> | drop | pin <on|off> | action <name> | select <throw|jump> | hover <x> <y> <w> <h> | clearhover | click | actions | behaviors | save [path] | load [path] | quit";

const DEFAULT_SAVE_PATH: &str = "mascot_save.json";

fn main() {
    let seed = env::args()
        .nth(1)
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(42);

    let mut engine = Engine::new(seed);
    let library = MascotLibrary::load_default();

    println!("picky-mascot demo driver (seed {})", seed);
    println!("{}", HELP);
    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", HELP),
            "tick" => {
                let count = parts
                    .next()
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .unwrap_or(1);
                let mut last = None;
                for _ in 0..count {
                    last = Some(engine.tick(Vec::new()));
                }
                if let Some(snapshot) = last {
                    print_snapshot(&snapshot);
                }
            }
            "state" => {
                let snapshot = engine.tick(Vec::new());
                print_snapshot(&snapshot);
            }
            "cursor" => {
                if let (Some(x), Some(y)) = (parse_f64(parts.next()), parse_f64(parts.next())) {
                    engine.tick(vec![MascotCommand::MoveCursor { x, y }]);
                    println!("cursor -> ({}, {})", x, y);
                } else {
                    println!("Usage: cursor <x> <y>");
                }
            }
            "viewport" => {
                if let (Some(width), Some(height)) =
                    (parse_f64(parts.next()), parse_f64(parts.next()))
                {
                    engine.tick(vec![MascotCommand::SetViewport { width, height }]);
                    println!("viewport -> {}x{}", width, height);
                } else {
                    println!("Usage: viewport <w> <h>");
                }
            }
            "drag" => {
                let snapshot = engine.tick(vec![MascotCommand::DragStart]);
                print_snapshot(&snapshot);
            }
            "move" => {
                if let (Some(x), Some(y)) = (parse_f64(parts.next()), parse_f64(parts.next())) {
                    let snapshot = engine.tick(vec![MascotCommand::DragMove { x, y }]);
                    print_snapshot(&snapshot);
                } else {
                    println!("Usage: move <x> <y>");
                }
            }
            "drop" => {
                let snapshot = engine.tick(vec![MascotCommand::DragEnd]);
                print_snapshot(&snapshot);
            }
            "pin" => match parts.next() {
                Some("on") => {
                    engine.tick(vec![MascotCommand::SetPinned(true)]);
                    println!("pinned");
                }
                Some("off") => {
                    engine.tick(vec![MascotCommand::SetPinned(false)]);
                    println!("unpinned");
                }
                _ => println!("Usage: pin <on|off>"),
            },
            "action" => {
                if let Some(name) = parts.next() {
                    if library.action(name).is_none() {
                        println!("Unknown action: {}", name);
                        continue;
                    }
                    let snapshot = engine.tick(vec![MascotCommand::ForceAction {
                        name: name.to_string(),
                    }]);
                    print_snapshot(&snapshot);
                } else {
                    println!("Usage: action <name>");
                }
            }
            "select" => match parts.next() {
                Some("throw") => {
                    engine.tick(vec![MascotCommand::ForceAction {
                        name: "SelectElement".to_string(),
                    }]);
                    println!("selection mode: throw");
                }
                Some("jump") => {
                    engine.tick(vec![MascotCommand::ForceAction {
                        name: "SelectEdge".to_string(),
                    }]);
                    println!("selection mode: jump");
                }
                _ => println!("Usage: select <throw|jump>"),
            },
            "hover" => {
                let values = [
                    parse_f64(parts.next()),
                    parse_f64(parts.next()),
                    parse_f64(parts.next()),
                    parse_f64(parts.next()),
                ];
                if let [Some(x), Some(y), Some(width), Some(height)] = values {
                    engine.tick(vec![MascotCommand::HoverElement {
                        rect: Rect::new(x, y, width, height),
                    }]);
                    println!("hovering {}x{} at ({}, {})", width, height, x, y);
                } else {
                    println!("Usage: hover <x> <y> <w> <h>");
                }
            }
            "clearhover" => {
                engine.tick(vec![MascotCommand::ClearHover]);
                println!("hover cleared");
            }
            "click" => {
                let snapshot = engine.tick(vec![MascotCommand::Click]);
                print_snapshot(&snapshot);
            }
            "actions" => {
                for action in &library.actions.actions {
                    println!(
                        "{:<28} {:?} embed={:?} steps={}",
                        action.name,
                        action.action_type,
                        action.embed,
                        action.steps.len()
                    );
                }
            }
            "behaviors" => {
                for behavior in &library.behaviors.behaviors {
                    println!(
                        "{:<24} freq={:<3} group={} conditions={} next={}",
                        behavior.name,
                        behavior.frequency,
                        behavior.group_index,
                        behavior.conditions.len(),
                        behavior.next_behaviors.len()
                    );
                }
            }
            "save" => {
                let path = parts.next().unwrap_or(DEFAULT_SAVE_PATH);
                match engine.save_to_path(path) {
                    Ok(()) => println!("saved to {}", path),
                    Err(err) => println!("save failed: {}", err),
                }
            }
            "load" => {
                let path = parts.next().unwrap_or(DEFAULT_SAVE_PATH);
                match engine.load_from_path(path) {
                    Ok(()) => println!("loaded from {}", path),
                    Err(err) => println!("load failed: {}", err),
                }
            }
            _ => println!("Unknown command: {} (try help)", cmd),
        }
    }
}

fn parse_f64(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.parse::<f64>().ok())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "tick {:>6}  {} [{}] sprite={} pos=({:.1}, {:.1}) vel=({:.2}, {:.2}) facing={}",
        snapshot.raw_tick,
        snapshot.behavior,
        snapshot.action,
        snapshot.sprite,
        snapshot.position.0,
        snapshot.position.1,
        snapshot.velocity.0,
        snapshot.velocity.1,
        if snapshot.look_right { "right" } else { "left" },
    );
    if snapshot.selection_mode != SelectionMode::Inactive {
        println!("  selection mode: {:?}", snapshot.selection_mode);
    }
    if let Some(element) = &snapshot.active_element {
        println!(
            "  active element #{} at ({:.0}, {:.0}) {}x{}",
            element.id,
            element.rect.x,
            element.rect.y,
            element.rect.width,
            element.rect.height
        );
    }
    if let Some(carried) = &snapshot.carried {
        println!(
            "  carrying element #{} at ({:.0}, {:.0})",
            carried.id, carried.rect.x, carried.rect.y
        );
    }
    for (id, body) in &snapshot.thrown {
        println!(
            "  thrown element #{} at ({:.0}, {:.0}) vel=({:.1}, {:.1})",
            id, body.rect.x, body.rect.y, body.vx, body.vy
        );
    }
    for command in &snapshot.render_commands {
        println!("  render: {:?}", command);
    }
    for line in &snapshot.log {
        println!("  log: {}", line);
    }
}
