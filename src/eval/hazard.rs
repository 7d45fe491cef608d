use mips_sim::cpu::CPUPolicy;
use mips_sim::encode;
use mips_sim::memory::MemoryStore;
use mips_sim::run_wrapper::run_image;

const PAIRS: usize = 10;

/// A workload of instruction pairs where the first `hazard_pairs` pairs are
/// load-use dependent (one stall bubble each) and the rest are independent
fn workload(hazard_pairs: usize) -> (Vec<u32>, Vec<u32>) {
    let mut text = Vec::new();
    for i in 0..PAIRS {
        if i < hazard_pairs {
            text.push(encode::lw(1, 0, 0));
            text.push(encode::add(2, 1, 1));
        } else {
            text.push(encode::addi(3, 0, 1));
            text.push(encode::addi(4, 0, 2));
        }
    }
    text.push(encode::HALT);
    (vec![7], text)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Sweep the load-use hazard density and measure CPI
    let mut data: Vec<(i32, f64)> = Vec::new();
    let mut y_max: f64 = 0.;
    for hazard_pairs in 0..=PAIRS {
        let (data_words, text) = workload(hazard_pairs);
        let image = encode::assemble_image(&data_words, &text);
        let mut mem = MemoryStore::from_bytes(&image);
        let report = run_image(&mut mem, CPUPolicy::default())?;
        let cpi = report.cpi();
        data.push((hazard_pairs as i32, cpi));
        y_max = y_max.max(cpi);
    }

    // Plot the data
    use plotters::prelude::*;

    std::fs::create_dir_all("eval")?;
    let output_path = "eval/hazard_eval.svg";

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption("CPI vs load-use hazard density", ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..PAIRS as i32, 1.0..y_max * 1.1)?;
    ctx.configure_mesh()
        .x_desc("Load-use pairs per 10 instruction pairs")
        .y_desc("CPI")
        .draw()?;

    ctx.draw_series(LineSeries::new(data.iter().copied(), &BLUE))?;

    Ok(())
}
