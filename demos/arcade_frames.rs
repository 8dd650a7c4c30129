extern crate gym_burn;

use std::{fs, path::PathBuf};

use gym_burn::env::{
    arcade::{
        breakout::{BreakoutConfig, FIRE, LEFT, RIGHT},
        Framebuffer,
    },
    base::Env,
    render::RenderMode,
};

// binary PPM, viewable by most image tools
fn write_ppm(path: &PathBuf, frame: &Framebuffer) -> anyhow::Result<()> {
    let mut bytes = format!("P6\n{} {}\n255\n", Framebuffer::WIDTH, Framebuffer::HEIGHT).into_bytes();
    bytes.extend_from_slice(frame.as_bytes());
    fs::write(path, bytes)?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut env = BreakoutConfig::new().with_seed(Some(0)).init()?;
    let out_dir = PathBuf::from("frames");
    fs::create_dir_all(&out_dir)?;

    let mut frame = env.reset();
    let mut total = 0.0;

    for step in 0..600 {
        let action = match step % 40 {
            0 => FIRE,
            s if s < 20 => LEFT,
            _ => RIGHT,
        };
        let res = env.step(&action);
        total += res.reward;
        frame = res.obs;

        if step % 100 == 0 {
            let view = frame.view()?;
            let lit = view
                .outer_iter()
                .map(|row| row.iter().filter(|c| **c > 0).count())
                .sum::<usize>();
            println!("step {step}: {lit} lit channel values");
            write_ppm(&out_dir.join(format!("breakout_{step:04}.ppm")), &frame)?;
        }

        if res.done {
            break;
        }
    }

    env.render(RenderMode::Human);
    println!("total reward {total}");
    write_ppm(&out_dir.join("breakout_last.ppm"), &frame)?;

    Ok(())
}
