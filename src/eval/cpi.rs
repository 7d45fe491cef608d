use mips_sim::cpu::CPUPolicy;
use mips_sim::encode;
use mips_sim::memory::MemoryStore;
use mips_sim::run_wrapper::run_image;

/// Straight-line code with no dependencies between neighbors
fn straight_line() -> (Vec<u32>, Vec<u32>) {
    let mut text = Vec::new();
    for i in 0..16u32 {
        text.push(encode::addi(i % 8 + 1, 0, i as u16));
    }
    text.push(encode::HALT);
    (vec![], text)
}

/// Every instruction consumes the previous result through forwarding
fn forwarding_chain() -> (Vec<u32>, Vec<u32>) {
    let mut text = vec![encode::addi(1, 0, 1)];
    for _ in 0..15 {
        text.push(encode::add(1, 1, 1));
    }
    text.push(encode::HALT);
    (vec![], text)
}

/// Back-to-back load-use pairs, each costing one stall bubble
fn load_use_pairs() -> (Vec<u32>, Vec<u32>) {
    let mut text = Vec::new();
    for _ in 0..8 {
        text.push(encode::lw(1, 0, 0));
        text.push(encode::add(2, 1, 1));
    }
    text.push(encode::HALT);
    (vec![3], text)
}

/// Always-taken branches, each flushing one fetched slot
fn taken_branches() -> (Vec<u32>, Vec<u32>) {
    let mut text = Vec::new();
    for _ in 0..8 {
        text.push(encode::beq(0, 0, 1));
        text.push(encode::addi(9, 0, 99));
    }
    text.push(encode::HALT);
    (vec![], text)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("eval")?;
    let mut writer = csv::Writer::from_path("eval/cpi_eval.csv")?;
    writer.write_record(["Workload", "Instructions", "Cycles", "CPI"])?;

    let workloads: Vec<(&str, (Vec<u32>, Vec<u32>))> = vec![
        ("straight-line", straight_line()),
        ("forwarding-chain", forwarding_chain()),
        ("load-use-pairs", load_use_pairs()),
        ("taken-branches", taken_branches()),
    ];

    for (name, (data, text)) in workloads {
        eprintln!("Running workload: {}", name);
        let image = encode::assemble_image(&data, &text);
        let mut mem = MemoryStore::from_bytes(&image);
        let report = run_image(&mut mem, CPUPolicy::default())?;

        writer.write_record([
            name,
            &report.instruction_count.to_string(),
            &report.cycle_count.to_string(),
            &format!("{:.3}", report.cpi()),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
