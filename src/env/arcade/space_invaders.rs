use burn::config::Config;
use log::warn;
use rand::{rngs::StdRng, Rng};

use crate::{
    common::{
        errors::Result,
        spaces::{Discrete, Space},
        utils::seeded_rng,
    },
    env::{
        base::{Env, EnvObservation, EnvSpec, Info, Metadata, RewardRange},
        render::{render_header, RenderMode},
    },
};

use super::{
    arcade_metadata, screen_space, Framebuffer, Rgb, CYAN, GREEN, MAGENTA, MAX_ARCADE_STEPS, RED,
    WHITE, YELLOW,
};

pub const NOOP: usize = 0;
pub const FIRE: usize = 1;
pub const RIGHT: usize = 2;
pub const LEFT: usize = 3;
pub const RIGHT_FIRE: usize = 4;
pub const LEFT_FIRE: usize = 5;

const SCREEN_WIDTH: f64 = Framebuffer::WIDTH as f64;
const SCREEN_HEIGHT: f64 = Framebuffer::HEIGHT as f64;

const PLAYER_SPEED: f64 = 3.0;
const BULLET_SPEED: f64 = 6.0;
const ALIEN_BULLET_SPEED: f64 = BULLET_SPEED * 0.7;
const ALIEN_SPEED: f64 = 0.5;
const ALIEN_DROP: f64 = 8.0;

const PLAYER_WIDTH: f64 = 8.0;
const PLAYER_HEIGHT: f64 = 6.0;
const PLAYER_Y: f64 = SCREEN_HEIGHT - 40.0;
const ALIEN_WIDTH: f64 = 6.0;
const ALIEN_HEIGHT: f64 = 6.0;
const ALIEN_PITCH_X: f64 = 12.0;
const ALIEN_PITCH_Y: f64 = 10.0;
const BULLET_WIDTH: i32 = 2;
const BULLET_HEIGHT: i32 = 4;

pub const ALIEN_ROWS: usize = 5;
pub const ALIEN_COLS: usize = 11;
const FORMATION_START: (f64, f64) = (10.0, 40.0);
const FORMATION_MARGIN: f64 = 10.0;
// height used to decide the formation has reached the player
const FORMATION_DEPTH: f64 = ALIEN_ROWS as f64 * 8.0;

const MAX_PLAYER_BULLETS: usize = 3;
const ALIEN_MOVE_PERIOD: usize = 10;
const ALIEN_FIRE_PERIOD: usize = 60;
const ALIEN_FIRE_PROB: f64 = 0.3;

const HIT_PENALTY: f64 = 50.0;
const WAVE_BONUS: f64 = 100.0;
const ROW_POINTS: [usize; ALIEN_ROWS] = [30, 20, 20, 10, 10];
const ROW_COLORS: [Rgb; ALIEN_ROWS] = [MAGENTA, CYAN, YELLOW, GREEN, RED];

const ALIEN_SPRITE: [&str; 6] = [
    ".#..#.",
    "..##..",
    ".####.",
    "##..##",
    "######",
    ".#..#.",
];
const PLAYER_SPRITE: [&str; 6] = [
    "...##...",
    "..####..",
    "..####..",
    ".######.",
    "########",
    "########",
];

#[derive(Config)]
pub struct SpaceInvadersConfig {
    #[config(default = 3)]
    pub lives: usize,
    #[config(default = "MAX_ARCADE_STEPS")]
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl SpaceInvadersConfig {
    pub fn init(&self) -> Result<SpaceInvadersEnv> {
        let mut env = SpaceInvadersEnv {
            player_x: 0.0,
            player_bullets: Vec::new(),
            alien_bullets: Vec::new(),
            aliens: [[true; ALIEN_COLS]; ALIEN_ROWS],
            formation_x: FORMATION_START.0,
            formation_y: FORMATION_START.1,
            moving_right: true,
            score: 0,
            lives: self.lives,
            steps: 0,
            frame: 0,
            steps_beyond_done: None,
            start_lives: self.lives,
            max_steps: self.max_steps,
            screen: Framebuffer::new(),
            rng: seeded_rng(self.seed),
            action_space: Discrete::new(6)?.into(),
            observation_space: screen_space()?,
        };
        env.reset();

        Ok(env)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bullet {
    x: f64,
    y: f64,
}

/// A cannon at the bottom of the screen against a marching 5x11 formation.
/// Clearing a wave respawns it at the top with a bonus.
#[derive(Debug, Clone)]
pub struct SpaceInvadersEnv {
    player_x: f64,
    player_bullets: Vec<Bullet>,
    alien_bullets: Vec<Bullet>,
    aliens: [[bool; ALIEN_COLS]; ALIEN_ROWS],
    formation_x: f64,
    formation_y: f64,
    moving_right: bool,
    score: usize,
    lives: usize,
    steps: usize,
    frame: usize,
    steps_beyond_done: Option<usize>,

    start_lives: usize,
    max_steps: usize,

    screen: Framebuffer,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl SpaceInvadersEnv {
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn lives(&self) -> usize {
        self.lives
    }

    pub fn aliens_remaining(&self) -> usize {
        self.aliens.iter().flatten().filter(|a| **a).count()
    }

    fn alien_pos(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.formation_x + col as f64 * ALIEN_PITCH_X,
            self.formation_y + row as f64 * ALIEN_PITCH_Y,
        )
    }

    fn move_player(&mut self, dx: f64) {
        self.player_x = (self.player_x + dx).clamp(0.0, SCREEN_WIDTH - PLAYER_WIDTH);
    }

    fn fire(&mut self) {
        if self.player_bullets.len() < MAX_PLAYER_BULLETS {
            self.player_bullets.push(Bullet {
                x: self.player_x + PLAYER_WIDTH / 2.0,
                y: PLAYER_Y,
            });
        }
    }

    fn alien_fire(&mut self) {
        // lowest living alien of every column
        let shooters: Vec<(usize, usize)> = (0..ALIEN_COLS)
            .filter_map(|col| {
                (0..ALIEN_ROWS)
                    .rev()
                    .find(|&row| self.aliens[row][col])
                    .map(|row| (row, col))
            })
            .collect();

        if shooters.is_empty() {
            return;
        }

        let (row, col) = shooters[self.rng.gen_range(0..shooters.len())];
        let (x, y) = self.alien_pos(row, col);
        self.alien_bullets.push(Bullet {
            x: x + ALIEN_WIDTH / 2.0,
            y: y + ALIEN_HEIGHT,
        });
    }

    fn move_bullets(&mut self) {
        for b in self.player_bullets.iter_mut() {
            b.y -= BULLET_SPEED;
        }
        self.player_bullets.retain(|b| b.y >= 0.0);

        for b in self.alien_bullets.iter_mut() {
            b.y += ALIEN_BULLET_SPEED;
        }
        self.alien_bullets.retain(|b| b.y <= SCREEN_HEIGHT);
    }

    fn march(&mut self) {
        if self.moving_right {
            self.formation_x += ALIEN_SPEED;
            if self.formation_x + ALIEN_COLS as f64 * ALIEN_PITCH_X > SCREEN_WIDTH - FORMATION_MARGIN {
                self.moving_right = false;
                self.formation_y += ALIEN_DROP;
            }
        } else {
            self.formation_x -= ALIEN_SPEED;
            if self.formation_x < FORMATION_MARGIN {
                self.moving_right = true;
                self.formation_y += ALIEN_DROP;
            }
        }
    }

    fn alien_hit_by(&self, bullet: &Bullet) -> Option<(usize, usize)> {
        (0..ALIEN_ROWS)
            .flat_map(|row| (0..ALIEN_COLS).map(move |col| (row, col)))
            .find(|&(row, col)| {
                let (x, y) = self.alien_pos(row, col);
                self.aliens[row][col]
                    && bullet.x >= x
                    && bullet.x <= x + ALIEN_WIDTH
                    && bullet.y >= y
                    && bullet.y <= y + ALIEN_HEIGHT
            })
    }

    fn resolve_hits(&mut self) -> f64 {
        let mut reward = 0.0;

        // newest bullets first, each bullet takes out at most one alien
        for i in (0..self.player_bullets.len()).rev() {
            if let Some((row, col)) = self.alien_hit_by(&self.player_bullets[i]) {
                self.aliens[row][col] = false;
                self.player_bullets.remove(i);

                self.score += ROW_POINTS[row];
                reward += ROW_POINTS[row] as f64;
            }
        }

        let player_x = self.player_x;
        let before = self.alien_bullets.len();
        self.alien_bullets.retain(|b| {
            !(b.x >= player_x
                && b.x <= player_x + PLAYER_WIDTH
                && b.y >= PLAYER_Y
                && b.y <= PLAYER_Y + PLAYER_HEIGHT)
        });
        let hits = before - self.alien_bullets.len();

        self.lives = self.lives.saturating_sub(hits);
        reward -= hits as f64 * HIT_PENALTY;

        reward
    }

    fn respawn_wave(&mut self) {
        self.aliens = [[true; ALIEN_COLS]; ALIEN_ROWS];
        self.formation_x = FORMATION_START.0;
        self.formation_y = FORMATION_START.1;
    }

    fn draw(&mut self) {
        self.screen.clear();

        for row in 0..ALIEN_ROWS {
            for col in 0..ALIEN_COLS {
                if self.aliens[row][col] {
                    let (x, y) = self.alien_pos(row, col);
                    self.screen
                        .draw_sprite(x as i32, y as i32, &ALIEN_SPRITE, ROW_COLORS[row]);
                }
            }
        }

        self.screen
            .draw_sprite(self.player_x as i32, PLAYER_Y as i32, &PLAYER_SPRITE, GREEN);

        for b in &self.player_bullets {
            self.screen
                .fill_rect(b.x as i32, b.y as i32, BULLET_WIDTH, BULLET_HEIGHT, YELLOW);
        }
        for b in &self.alien_bullets {
            self.screen
                .fill_rect(b.x as i32, b.y as i32, BULLET_WIDTH, BULLET_HEIGHT, RED);
        }

        self.screen.draw_number(self.score, 10, 10, 6, WHITE);
        for i in 0..self.lives as i32 {
            self.screen.draw_sprite(
                Framebuffer::WIDTH as i32 - 40 - i * 10,
                10,
                &PLAYER_SPRITE,
                GREEN,
            );
        }

        self.screen.fill_rect(
            0,
            Framebuffer::HEIGHT as i32 - 20,
            Framebuffer::WIDTH as i32,
            2,
            GREEN,
        );
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("score".to_string(), self.score.into());
        info.insert("lives".to_string(), self.lives.into());
        info.insert(
            "aliens_remaining".to_string(),
            self.aliens_remaining().into(),
        );
        info.insert("player_x".to_string(), self.player_x.into());

        info
    }
}

impl Env<Framebuffer, usize> for SpaceInvadersEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Framebuffer> {
        self.steps += 1;
        self.frame += 1;

        match *action {
            FIRE => self.fire(),
            RIGHT => self.move_player(PLAYER_SPEED),
            LEFT => self.move_player(-PLAYER_SPEED),
            RIGHT_FIRE => {
                self.move_player(PLAYER_SPEED);
                self.fire();
            }
            LEFT_FIRE => {
                self.move_player(-PLAYER_SPEED);
                self.fire();
            }
            _ => {}
        }

        self.move_bullets();

        if self.frame % ALIEN_MOVE_PERIOD == 0 {
            self.march();
        }

        if self.frame % ALIEN_FIRE_PERIOD == 0 && self.rng.gen::<f64>() < ALIEN_FIRE_PROB {
            self.alien_fire();
        }

        let mut reward = self.resolve_hits();

        if self.formation_y + FORMATION_DEPTH > PLAYER_Y {
            self.lives = 0;
        }

        if self.aliens_remaining() == 0 {
            reward += WAVE_BONUS;
            self.respawn_wave();
        }

        let done = self.lives == 0 || self.steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("stepping SpaceInvaders after the game ended; call reset() first");
                    self.steps_beyond_done = Some(1);
                }
                Some(s) => self.steps_beyond_done = Some(s + 1),
            }
        }

        self.draw();

        EnvObservation {
            obs: self.screen.clone(),
            reward,
            done,
            info: self.info(),
        }
    }

    fn reset(&mut self) -> Framebuffer {
        self.respawn_wave();
        self.player_x = SCREEN_WIDTH / 2.0 - PLAYER_WIDTH / 2.0;
        self.moving_right = true;
        self.player_bullets.clear();
        self.alien_bullets.clear();

        self.score = 0;
        self.lives = self.start_lives;
        self.steps = 0;
        self.frame = 0;
        self.steps_beyond_done = None;

        self.draw();
        self.screen.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("SpaceInvaders");
            println!("Score: {} Lives: {}", self.score, self.lives);
            println!(
                "Player: ({:.1}) Aliens: {}",
                self.player_x,
                self.aliens_remaining()
            );
            println!(
                "Bullets: Player={}, Alien={}",
                self.player_bullets.len(),
                self.alien_bullets.len()
            );
        }
    }

    fn seed(&mut self, seed: Option<u64>) {
        self.rng = seeded_rng(seed);
        if let Some(seed) = seed {
            self.action_space.seed(seed);
        }
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: -HIT_PENALTY * MAX_PLAYER_BULLETS as f64,
            high: (ROW_POINTS[0] * MAX_PLAYER_BULLETS) as f64 + WAVE_BONUS,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(EnvSpec::new("SpaceInvaders-v4").with_max_episode_steps(self.max_steps))
    }

    fn metadata(&self) -> Metadata {
        arcade_metadata()
    }

    fn unwrapped(&self) -> &dyn Env<Framebuffer, usize> {
        self
    }
}

#[cfg(test)]
mod test {
    use crate::env::{
        arcade::{Framebuffer, GREEN, MAGENTA},
        base::Env,
    };

    use super::{
        Bullet, SpaceInvadersConfig, SpaceInvadersEnv, ALIEN_COLS, ALIEN_ROWS, FIRE, NOOP,
        PLAYER_Y,
    };

    fn env() -> SpaceInvadersEnv {
        SpaceInvadersConfig::new().with_seed(Some(0)).init().unwrap()
    }

    // a bullet that reaches the centre of alien (row, col) on the next step
    fn aim_at(env: &mut SpaceInvadersEnv, row: usize, col: usize) {
        let (x, y) = env.alien_pos(row, col);
        env.player_bullets.push(Bullet {
            x: x + 3.0,
            y: y + 3.0 + 6.0,
        });
    }

    #[test]
    fn test_row_points() {
        for (row, points) in [(0, 30.0), (1, 20.0), (2, 20.0), (3, 10.0), (4, 10.0)] {
            let mut env = env();
            env.aliens = [[false; ALIEN_COLS]; ALIEN_ROWS];
            env.aliens[row][3] = true;
            // a second survivor keeps the wave bonus out of the reward
            env.aliens[0][10] = true;
            aim_at(&mut env, row, 3);

            let res = env.step(&NOOP);
            assert_eq!(res.reward, points, "row {row}");
            assert_eq!(env.score(), points as usize);
        }
    }

    #[test]
    fn test_bullet_limit() {
        let mut env = env();
        for _ in 0..10 {
            env.step(&FIRE);
        }
        assert_eq!(env.player_bullets.len(), 3);
    }

    #[test]
    fn test_getting_hit_costs_a_life() {
        let mut env = env();
        let x = env.player_x + 4.0;
        env.alien_bullets.push(Bullet {
            x,
            y: PLAYER_Y - 1.0,
        });

        let res = env.step(&NOOP);
        assert_eq!(res.reward, -50.0);
        assert_eq!(env.lives(), 2);
        assert!(env.alien_bullets.is_empty());
    }

    #[test]
    fn test_cleared_wave_respawns() {
        let mut env = env();
        env.aliens = [[false; ALIEN_COLS]; ALIEN_ROWS];
        env.aliens[4][0] = true;
        env.formation_y = 60.0;
        aim_at(&mut env, 4, 0);

        let res = env.step(&NOOP);
        assert_eq!(res.reward, 10.0 + 100.0);
        assert_eq!(env.aliens_remaining(), ALIEN_ROWS * ALIEN_COLS);
        assert_eq!(env.formation_y, 40.0);
        assert!(!res.done);
    }

    #[test]
    fn test_formation_reaching_the_player_ends_the_game() {
        let mut env = env();
        env.formation_y = PLAYER_Y - 40.0 + 1.0;

        let res = env.step(&NOOP);
        assert!(res.done);
        assert_eq!(env.lives(), 0);
    }

    #[test]
    fn test_formation_marches_and_drops() {
        let mut env = env();
        for _ in 0..9 {
            env.step(&NOOP);
        }
        assert_eq!(env.formation_x, 10.0);
        env.step(&NOOP);
        assert_eq!(env.formation_x, 10.5);

        // 132 wide formation turns once its right edge passes x = 150
        env.formation_x = 17.9;
        for _ in 0..10 {
            env.step(&NOOP);
        }
        assert!(!env.moving_right);
        assert_eq!(env.formation_y, 48.0);
    }

    #[test]
    fn test_first_frame() {
        let mut env = env();
        let frame = env.reset();

        // 20 lit pixels per alien sprite
        assert_eq!(frame.count_color(MAGENTA), 11 * 20);
        assert_eq!(frame.pixel(0, Framebuffer::HEIGHT - 20), Some(GREEN));
    }
}
