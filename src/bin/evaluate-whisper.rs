
use rand::prelude::*;
use std::env;
use std::time::Instant;
use ::whisper::stats::*;
use ::whisper::*;

/// How a synthetic branch behaves over time.
#[derive(Clone, Copy, Debug)]
enum Behavior {
    /// Taken with some fixed probability
    Biased(f64),
    /// Strictly alternating between taken and not-taken
    Alternating,
}

#[derive(Clone, Copy, Debug)]
struct SyntheticBranch {
    pc: usize,
    tgt: usize,
    kind: BranchKind,
    behavior: Behavior,
    /// Consecutive executions per pass
    reps: usize,
    /// Hint word re-injected at the top of each pass, if any
    hint: Option<u32>,
}

/// Selector that predicts the opposite of the most recent outcome whenever
/// the history alternates.
const ALTERNATING_FORMULA: u16 = 0x005f;

fn build_program() -> Vec<SyntheticBranch> {
    let mut program = Vec::new();
    let base = 0x0040_0000usize;

    // Hot loop back-edges, almost always taken. Hinted strongly-taken.
    for i in 0..4 {
        let pc = base + i * 0x100;
        program.push(SyntheticBranch {
            pc,
            tgt: pc - 0x40,
            kind: BranchKind::DirectBranch,
            behavior: Behavior::Biased(0.98),
            reps: 1,
            hint: Some(0x0000_3010),
        });
    }

    // Error checks, never taken. Hinted strongly-not-taken.
    for i in 0..4 {
        let pc = base + 0x1000 + i * 0x100;
        program.push(SyntheticBranch {
            pc,
            tgt: pc + 0x200,
            kind: BranchKind::DirectBranch,
            behavior: Behavior::Biased(0.0),
            reps: 1,
            hint: Some(0x0000_0010),
        });
    }

    // A strictly alternating branch, predicted by a boolean formula over
    // the last eight outcomes.
    let formula_word = ((ALTERNATING_FORMULA as u32) << 14) | (0b01 << 12) | 0x10;
    program.push(SyntheticBranch {
        pc: base + 0x2000,
        tgt: base + 0x2200,
        kind: BranchKind::DirectBranch,
        behavior: Behavior::Alternating,
        reps: 16,
        hint: Some(formula_word),
    });

    // Data-dependent branches with no hints; the fallback has to learn
    // whatever it can.
    for i in 0..6 {
        let pc = base + 0x3000 + i * 0x100;
        program.push(SyntheticBranch {
            pc,
            tgt: pc + 0x80,
            kind: BranchKind::DirectBranch,
            behavior: Behavior::Biased(0.5 + 0.05 * i as f64),
            reps: 1,
            hint: None,
        });
    }

    // Unconditional control flow interleaved with the conditionals.
    program.push(SyntheticBranch {
        pc: base + 0x4000,
        tgt: base + 0x5000,
        kind: BranchKind::DirectJump,
        behavior: Behavior::Biased(1.0),
        reps: 1,
        hint: None,
    });
    program.push(SyntheticBranch {
        pc: base + 0x4100,
        tgt: base + 0x6000,
        kind: BranchKind::DirectCall,
        behavior: Behavior::Biased(1.0),
        reps: 1,
        hint: None,
    });

    program
}

fn sample(behavior: Behavior, step: usize, rng: &mut ThreadRng) -> Outcome {
    match behavior {
        Behavior::Biased(p) => rng.gen_bool(p).into(),
        Behavior::Alternating => (step % 2 == 0).into(),
    }
}

/// Run the whole program 'passes' times against a fresh predictor pair,
/// optionally injecting hints at the top of each pass.
fn run(program: &[SyntheticBranch], passes: usize, inject: bool) -> BranchStats {
    let mut fallback = GshareConfig {
        size: 1 << 12,
        history_bits: 12,
        max_strength: 1,
    }
    .build();
    let mut predictor = WhisperPredictor::new(16, &mut fallback);
    let mut stats = BranchStats::new();
    let mut rng = thread_rng();
    let tid: ThreadId = 0;

    for _ in 0..passes {
        if inject {
            // The program re-executes its hint instructions on every pass;
            // each hint lands 0x10 bytes before the branch it describes.
            for branch in program.iter() {
                if let Some(word) = branch.hint {
                    predictor.insert(branch.pc - 0x10, word);
                }
            }
        }

        for branch in program.iter() {
            if branch.kind.is_unconditional() {
                predictor.update_histories(
                    tid,
                    branch.pc,
                    true,
                    Outcome::T,
                    branch.tgt,
                    &mut None,
                );
                continue;
            }

            for step in 0..branch.reps {
                let mut hist = None;
                let prediction = predictor.lookup(tid, branch.pc, &mut hist);
                let outcome = sample(branch.behavior, step, &mut rng);
                stats.record(branch.pc, prediction, outcome);

                predictor.update_histories(
                    tid,
                    branch.pc,
                    false,
                    outcome,
                    branch.tgt,
                    &mut hist,
                );
                predictor.update(
                    tid,
                    branch.pc,
                    outcome,
                    &mut hist,
                    false,
                    branch.kind,
                    branch.tgt,
                );
            }
        }
    }

    stats
}

fn report(stats: &BranchStats, program: &[SyntheticBranch]) {
    println!("      Global hit rate: {}/{} ({:.2}% correct) ({} misses)",
        stats.global_hits(),
        stats.global_brns(),
        stats.hit_rate() * 100.0,
        stats.global_miss()
    );

    let hinted: Vec<usize> = program
        .iter()
        .filter(|b| b.hint.is_some())
        .map(|b| b.pc)
        .collect();
    let (mut hits, mut occ) = (0, 0);
    for pc in hinted.iter() {
        if let Some(data) = stats.data.get(pc) {
            hits += data.hits;
            occ += data.occ;
        }
    }
    if occ != 0 {
        println!("      Hinted branches: {}/{} ({:.2}% correct)",
            hits, occ, hits as f64 / occ as f64 * 100.0
        );
    }

    println!("      Most common branches:");
    for (pc, data) in stats.get_common_branches(4) {
        println!("        {:#010x} {:8}/{:8} ({:.4})",
            pc, data.hits, data.occ, data.hit_rate()
        );
    }

    let low = stats.get_low_rate_branches(4);
    if !low.is_empty() {
        println!("      Low hit-rate branches:");
        for (pc, data) in low {
            println!("        {:#010x} {:8}/{:8} ({:.4})",
                pc, data.hits, data.occ, data.hit_rate()
            );
        }
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let passes: usize = if args.len() > 1 {
        match args[1].parse() {
            Ok(n) => n,
            Err(_) => {
                println!("usage: {} [passes]", args[0]);
                return;
            }
        }
    } else {
        1000
    };

    let program = build_program();
    println!("[*] Built {} synthetic branches, {} passes", program.len(), passes);

    let start = Instant::now();
    let baseline = run(&program, passes, false);
    let hinted = run(&program, passes, true);
    println!("[*] ... simulated in {:.3?}", start.elapsed());
    println!();

    println!("[*] Fallback only:");
    report(&baseline, &program);
    println!();
    println!("[*] With hint injection:");
    report(&hinted, &program);
}
