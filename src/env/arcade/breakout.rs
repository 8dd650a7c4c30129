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
    arcade_metadata, screen_space, Framebuffer, Rgb, BLUE, GREEN, MAX_ARCADE_STEPS, ORANGE,
    PURPLE, RED, WHITE, YELLOW,
};

pub const NOOP: usize = 0;
pub const FIRE: usize = 1;
pub const RIGHT: usize = 2;
pub const LEFT: usize = 3;

const SCREEN_WIDTH: f64 = Framebuffer::WIDTH as f64;
const SCREEN_HEIGHT: f64 = Framebuffer::HEIGHT as f64;

const PADDLE_SPEED: f64 = 5.0;
const BALL_SPEED: f64 = 3.0;
const PADDLE_HEIGHT: f64 = 4.0;
const PADDLE_WIDTH: f64 = 16.0;
const PADDLE_Y: f64 = SCREEN_HEIGHT - 20.0;
const BALL_SIZE: f64 = 2.0;
const BALL_REST_Y: f64 = SCREEN_HEIGHT - 30.0;

const BRICK_WIDTH: f64 = 8.0;
const BRICK_HEIGHT: f64 = 6.0;
const BRICK_START_Y: f64 = 60.0;
pub const BRICK_ROWS: usize = 6;
pub const BRICK_COLS: usize = 18;

const CLEAR_BONUS: f64 = 100.0;
const ROW_COLORS: [Rgb; BRICK_ROWS] = [RED, ORANGE, YELLOW, GREEN, BLUE, PURPLE];

#[derive(Config)]
pub struct BreakoutConfig {
    #[config(default = 5)]
    pub lives: usize,
    #[config(default = "MAX_ARCADE_STEPS")]
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl BreakoutConfig {
    pub fn init(&self) -> Result<BreakoutEnv> {
        let mut env = BreakoutEnv {
            ball_x: 0.0,
            ball_y: 0.0,
            ball_vel_x: 0.0,
            ball_vel_y: 0.0,
            paddle_x: 0.0,
            ball_stuck: true,
            bricks: [[true; BRICK_COLS]; BRICK_ROWS],
            score: 0,
            lives: self.lives,
            steps: 0,
            steps_beyond_done: None,
            start_lives: self.lives,
            max_steps: self.max_steps,
            screen: Framebuffer::new(),
            rng: seeded_rng(self.seed),
            action_space: Discrete::new(4)?.into(),
            observation_space: screen_space()?,
        };
        env.reset();

        Ok(env)
    }
}

/// Brick breaking with a 6x18 wall. The ball starts resting on the paddle and
/// is launched with FIRE; higher rows are worth more.
#[derive(Debug, Clone)]
pub struct BreakoutEnv {
    ball_x: f64,
    ball_y: f64,
    ball_vel_x: f64,
    ball_vel_y: f64,
    paddle_x: f64,
    ball_stuck: bool,
    bricks: [[bool; BRICK_COLS]; BRICK_ROWS],
    score: usize,
    lives: usize,
    steps: usize,
    steps_beyond_done: Option<usize>,

    start_lives: usize,
    max_steps: usize,

    screen: Framebuffer,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

/// Points for breaking a brick in `row`, counted from the top.
pub fn brick_points(row: usize) -> f64 {
    (BRICK_ROWS - row + 1) as f64
}

impl BreakoutEnv {
    pub fn score(&self) -> usize {
        self.score
    }

    pub fn lives(&self) -> usize {
        self.lives
    }

    pub fn bricks_remaining(&self) -> usize {
        self.bricks.iter().flatten().filter(|b| **b).count()
    }

    fn rest_ball(&mut self) {
        self.ball_x = self.paddle_x + PADDLE_WIDTH / 2.0;
        self.ball_y = BALL_REST_Y;
        self.ball_vel_x = 0.0;
        self.ball_vel_y = 0.0;
        self.ball_stuck = true;
    }

    fn move_ball(&mut self) -> f64 {
        let mut reward = 0.0;

        self.ball_x += self.ball_vel_x;
        self.ball_y += self.ball_vel_y;

        if self.ball_x <= 0.0 || self.ball_x >= SCREEN_WIDTH - BALL_SIZE {
            self.ball_vel_x = -self.ball_vel_x;
            self.ball_x = self.ball_x.clamp(0.0, SCREEN_WIDTH - BALL_SIZE);
        }

        if self.ball_y <= 0.0 {
            self.ball_vel_y = -self.ball_vel_y;
            self.ball_y = 0.0;
        }

        let ball_bottom = self.ball_y + BALL_SIZE;
        if ball_bottom >= PADDLE_Y
            && ball_bottom <= PADDLE_Y + PADDLE_HEIGHT
            && self.ball_x + BALL_SIZE >= self.paddle_x
            && self.ball_x <= self.paddle_x + PADDLE_WIDTH
        {
            self.ball_vel_y = -self.ball_vel_y.abs();

            let offset = (self.ball_x + BALL_SIZE / 2.0) - (self.paddle_x + PADDLE_WIDTH / 2.0);
            let normalised = offset / (PADDLE_WIDTH / 2.0);
            self.ball_vel_x = normalised * BALL_SPEED * 0.75;
        }

        // the cell index truncates toward zero, like the grid it was drawn on
        let row = ((self.ball_y - BRICK_START_Y) / BRICK_HEIGHT) as i64;
        let col = (self.ball_x / BRICK_WIDTH) as i64;
        if (0..BRICK_ROWS as i64).contains(&row) && (0..BRICK_COLS as i64).contains(&col) {
            let (row, col) = (row as usize, col as usize);
            if self.bricks[row][col] {
                self.bricks[row][col] = false;
                self.ball_vel_y = -self.ball_vel_y;

                reward = brick_points(row);
                self.score += reward as usize;
            }
        }

        if self.ball_y > SCREEN_HEIGHT && self.lives > 0 {
            self.lives -= 1;
            if self.lives > 0 {
                self.rest_ball();
            }
        }

        reward
    }

    fn draw(&mut self) {
        let screen = &mut self.screen;
        screen.clear();

        for (row, bricks) in self.bricks.iter().enumerate() {
            for (col, _) in bricks.iter().enumerate().filter(|(_, b)| **b) {
                screen.fill_rect(
                    (col as f64 * BRICK_WIDTH) as i32,
                    (BRICK_START_Y + row as f64 * BRICK_HEIGHT) as i32,
                    BRICK_WIDTH as i32 - 1,
                    BRICK_HEIGHT as i32 - 1,
                    ROW_COLORS[row],
                );
            }
        }

        screen.fill_rect(
            self.paddle_x as i32,
            PADDLE_Y as i32,
            PADDLE_WIDTH as i32,
            PADDLE_HEIGHT as i32,
            WHITE,
        );

        let ball_x = if self.ball_stuck {
            self.paddle_x + PADDLE_WIDTH / 2.0 - BALL_SIZE / 2.0
        } else {
            self.ball_x
        };
        let ball_y = if self.ball_stuck {
            BALL_REST_Y
        } else {
            self.ball_y
        };
        screen.fill_rect(
            ball_x as i32,
            ball_y as i32,
            BALL_SIZE as i32,
            BALL_SIZE as i32,
            WHITE,
        );

        screen.draw_number(self.score, 10, 10, 6, WHITE);
        for i in 0..self.lives as i32 {
            screen.fill_rect(10 + i * 8, 25, 6, 3, WHITE);
        }
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("score".to_string(), self.score.into());
        info.insert("lives".to_string(), self.lives.into());
        info.insert("ball_x".to_string(), self.ball_x.into());
        info.insert("ball_y".to_string(), self.ball_y.into());
        info.insert(
            "bricks_remaining".to_string(),
            self.bricks_remaining().into(),
        );

        info
    }
}

impl Env<Framebuffer, usize> for BreakoutEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Framebuffer> {
        self.steps += 1;

        match *action {
            FIRE if self.ball_stuck => {
                self.ball_stuck = false;
                self.ball_vel_x = (self.rng.gen::<f64>() - 0.5) * 2.0 * BALL_SPEED;
                self.ball_vel_y = -BALL_SPEED;
            }
            RIGHT => {
                self.paddle_x = (self.paddle_x + PADDLE_SPEED).min(SCREEN_WIDTH - PADDLE_WIDTH);
                if self.ball_stuck {
                    self.ball_x = self.paddle_x + PADDLE_WIDTH / 2.0;
                }
            }
            LEFT => {
                self.paddle_x = (self.paddle_x - PADDLE_SPEED).max(0.0);
                if self.ball_stuck {
                    self.ball_x = self.paddle_x + PADDLE_WIDTH / 2.0;
                }
            }
            _ => {}
        }

        let mut reward = if self.ball_stuck {
            0.0
        } else {
            self.move_ball()
        };

        let cleared = self.bricks_remaining() == 0;
        if cleared {
            reward += CLEAR_BONUS;
        }

        let done = self.lives == 0 || cleared || self.steps >= self.max_steps;
        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("stepping Breakout after the game ended; call reset() first");
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
        self.bricks = [[true; BRICK_COLS]; BRICK_ROWS];
        self.paddle_x = SCREEN_WIDTH / 2.0 - PADDLE_WIDTH / 2.0;
        self.ball_x = SCREEN_WIDTH / 2.0;
        self.ball_y = BALL_REST_Y;
        self.ball_vel_x = 0.0;
        self.ball_vel_y = 0.0;
        self.ball_stuck = true;

        self.score = 0;
        self.lives = self.start_lives;
        self.steps = 0;
        self.steps_beyond_done = None;

        self.draw();
        self.screen.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("Breakout");
            println!("Score: {}, Lives: {}", self.score, self.lives);
            println!(
                "Ball: ({:.1}, {:.1}) Velocity: ({:.1}, {:.1})",
                self.ball_x, self.ball_y, self.ball_vel_x, self.ball_vel_y
            );
            println!("Bricks remaining: {}", self.bricks_remaining());
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
            low: 0.0,
            high: brick_points(0) + CLEAR_BONUS,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(EnvSpec::new("Breakout-v4").with_max_episode_steps(self.max_steps))
    }

    fn metadata(&self) -> Metadata {
        arcade_metadata()
    }

    fn unwrapped(&self) -> &dyn Env<Framebuffer, usize> {
        self
    }
}
