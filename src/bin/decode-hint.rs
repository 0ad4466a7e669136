
use std::env;
use ::whisper::*;

fn parse_word(s: &str) -> Option<u32> {
    let trimmed = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, 16).ok()
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("usage: {} <hint word> ...", args[0]);
        return;
    }

    for arg in &args[1..] {
        let word = match parse_word(arg) {
            Some(word) => word,
            None => {
                println!("{}: not a 32-bit hex word", arg);
                continue;
            }
        };

        let hint = Hint::from_word(word);
        println!("{:#010x}: {}", word, hint);
        println!("    history length: {}", hint.hist_length());
        match hint.bias_override() {
            Some(Outcome::T) => println!("    bias: strongly taken"),
            Some(Outcome::N) => println!("    bias: strongly not-taken"),
            None => println!("    bias: none (formula {:#06x})", hint.bool_formula),
        }
    }
}
