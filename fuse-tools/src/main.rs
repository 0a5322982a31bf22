use std::env;
use std::fs;
use std::path::PathBuf;

use fuse_engine::score;

const MAGIC: &[u8; 4] = b"FUSE";
const DUMMY_EVENT_COUNT: u8 = 8;
const DUMMY_WAIT_MS: u32 = 500;

fn main() {
    let mut args = env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_help();
        return;
    };

    match cmd.as_str() {
        "dummy" => dummy_cmd(args.collect()),
        "inspect" => inspect_cmd(args.collect()),
        "encode" => encode_cmd(args.collect()),
        "-h" | "--help" => print_help(),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
        }
    }
}

/// Emits the canonical demo score: 8 events, 500ms apart, all on device 0.
fn dummy_cmd(args: Vec<String>) {
    let mut out_path = PathBuf::from("fuses.bin");

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                if let Some(path) = iter.next() {
                    out_path = PathBuf::from(path);
                } else {
                    eprintln!("--out requires a path");
                    return;
                }
            }
            "-h" | "--help" => {
                print_dummy_help();
                return;
            }
            _ => {
                eprintln!("Unknown dummy arg: {}", arg);
                print_dummy_help();
                return;
            }
        }
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.push(DUMMY_EVENT_COUNT);
    bytes.extend_from_slice(&0b0000_0001u16.to_le_bytes());
    for fuse_index in 0..DUMMY_EVENT_COUNT {
        let timestamp_ms = fuse_index as u32 * DUMMY_WAIT_MS;
        bytes.extend_from_slice(&timestamp_ms.to_le_bytes());
        bytes.push(0); // device index
        bytes.push(fuse_index);
        bytes.extend_from_slice(&[0xFF, 0xFF]);
    }

    match fs::write(&out_path, &bytes) {
        Ok(()) => println!("Wrote {} ({} bytes)", out_path.display(), bytes.len()),
        Err(err) => eprintln!("Failed to write {}: {}", out_path.display(), err),
    }
}

/// Decodes a score file and prints its header, events, and computed
/// total score-time duration (excluding fuse hold time, which is an
/// engine-level config unknown to the file alone).
fn inspect_cmd(args: Vec<String>) {
    let Some(path) = args.first() else {
        eprintln!("usage: fuse-tools inspect <path>");
        return;
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("Failed to read {}: {}", path, err);
            return;
        }
    };

    match score::decode(&bytes) {
        Ok(parsed) => {
            println!("device_mask: {:#018b}", parsed.device_mask());
            println!("event_count: {}", parsed.event_count());
            println!("last_event_timestamp_ms: {}", parsed.total_duration_ms());
            for (index, event) in parsed.events().iter().enumerate() {
                println!(
                    "  [{:>3}] t={:>8}ms device={:>2} fuse={:>2}",
                    index, event.timestamp_ms, event.device_index, event.fuse_index
                );
            }
        }
        Err(err) => eprintln!("Invalid score: {}", err),
    }
}

/// Builds a score from a text file of `timestamp,device,fuse` lines.
fn encode_cmd(args: Vec<String>) {
    let (Some(input), Some(output)) = (args.first(), args.get(1)) else {
        eprintln!("usage: fuse-tools encode <input.csv> <output.bin>");
        return;
    };

    let text = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Failed to read {}: {}", input, err);
            return;
        }
    };

    let mut device_mask: u16 = 0;
    let mut events = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let (Some(timestamp), Some(device), Some(fuse)) =
            (fields.first(), fields.get(1), fields.get(2))
        else {
            eprintln!("line {}: expected timestamp,device,fuse", line_no + 1);
            return;
        };
        let (Ok(timestamp), Ok(device), Ok(fuse)) =
            (timestamp.parse::<u32>(), device.parse::<u8>(), fuse.parse::<u8>())
        else {
            eprintln!("line {}: could not parse fields", line_no + 1);
            return;
        };
        device_mask |= 1 << device;
        events.push((timestamp, device, fuse));
    }

    if events.is_empty() {
        eprintln!("no events parsed from {}", input);
        return;
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.push(events.len() as u8);
    bytes.extend_from_slice(&device_mask.to_le_bytes());
    for (timestamp, device, fuse) in &events {
        bytes.extend_from_slice(&timestamp.to_le_bytes());
        bytes.push(*device);
        bytes.push(*fuse);
        bytes.extend_from_slice(&[0xFF, 0xFF]);
    }

    // Validate via the real decoder before writing, so a malformed
    // input file is caught here rather than at playback time.
    if let Err(err) = score::decode(&bytes) {
        eprintln!("encoded score would be rejected by the engine: {}", err);
        return;
    }

    match fs::write(output, &bytes) {
        Ok(()) => println!("Wrote {} ({} bytes)", output, bytes.len()),
        Err(err) => eprintln!("Failed to write {}: {}", output, err),
    }
}

fn print_help() {
    println!(
        "fuse-tools\n\nCommands:\n  dummy        Write the canonical 8-event demo score\n  inspect      Decode and print a score file\n  encode       Build a score from a timestamp,device,fuse text file\n\nRun 'fuse-tools <command> --help' for options."
    );
}

fn print_dummy_help() {
    println!("Usage: fuse-tools dummy [options]\n\nOptions:\n  --out <path>   Output path (default fuses.bin)\n  -h, --help     Show this help");
}
