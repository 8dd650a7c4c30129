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

use super::{arcade_metadata, screen_space, Framebuffer, MAX_ARCADE_STEPS, WHITE};

pub const NOOP: usize = 0;
pub const FIRE: usize = 1;
pub const UP: usize = 2;
pub const DOWN: usize = 3;

const SCREEN_WIDTH: f64 = Framebuffer::WIDTH as f64;
const SCREEN_HEIGHT: f64 = Framebuffer::HEIGHT as f64;

const PADDLE_SPEED: f64 = 4.0;
const OPPONENT_SPEED: f64 = PADDLE_SPEED * 0.8;
const OPPONENT_DEAD_ZONE: f64 = 2.0;
const BALL_SPEED: f64 = 3.0;
const PADDLE_HEIGHT: f64 = 15.0;
const PADDLE_WIDTH: f64 = 2.0;
const BALL_SIZE: f64 = 2.0;
const SPIN: f64 = 0.1;

#[derive(Config)]
pub struct PongConfig {
    /// Points either side needs to end the match.
    #[config(default = 21)]
    pub winning_score: usize,
    #[config(default = "MAX_ARCADE_STEPS")]
    pub max_steps: usize,
    pub seed: Option<u64>,
}

impl PongConfig {
    pub fn init(&self) -> Result<PongEnv> {
        let mut env = PongEnv {
            ball_x: 0.0,
            ball_y: 0.0,
            ball_vel_x: 0.0,
            ball_vel_y: 0.0,
            left_paddle_y: 0.0,
            right_paddle_y: 0.0,
            left_score: 0,
            right_score: 0,
            steps: 0,
            steps_beyond_done: None,
            winning_score: self.winning_score,
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

/// Two paddle Pong. The agent plays the right paddle against a simple
/// tracking opponent on the left.
#[derive(Debug, Clone)]
pub struct PongEnv {
    ball_x: f64,
    ball_y: f64,
    ball_vel_x: f64,
    ball_vel_y: f64,
    left_paddle_y: f64,
    right_paddle_y: f64,
    left_score: usize,
    right_score: usize,
    steps: usize,
    steps_beyond_done: Option<usize>,

    winning_score: usize,
    max_steps: usize,

    screen: Framebuffer,
    rng: StdRng,
    action_space: Space,
    observation_space: Space,
}

impl PongEnv {
    pub fn scores(&self) -> (usize, usize) {
        (self.left_score, self.right_score)
    }

    fn serve(&mut self) {
        self.ball_x = SCREEN_WIDTH / 2.0;
        self.ball_y = SCREEN_HEIGHT / 2.0;
        self.ball_vel_x = if self.rng.gen::<f64>() > 0.5 {
            BALL_SPEED
        } else {
            -BALL_SPEED
        };
        self.ball_vel_y = (self.rng.gen::<f64>() - 0.5) * 2.0 * BALL_SPEED;
    }

    fn move_opponent(&mut self) {
        let ball_center = self.ball_y + BALL_SIZE / 2.0;
        let paddle_center = self.left_paddle_y + PADDLE_HEIGHT / 2.0;

        if ball_center < paddle_center - OPPONENT_DEAD_ZONE {
            self.left_paddle_y = (self.left_paddle_y - OPPONENT_SPEED).max(0.0);
        } else if ball_center > paddle_center + OPPONENT_DEAD_ZONE {
            self.left_paddle_y =
                (self.left_paddle_y + OPPONENT_SPEED).min(SCREEN_HEIGHT - PADDLE_HEIGHT);
        }
    }

    fn hits_paddle(&self, paddle_y: f64) -> bool {
        self.ball_y + BALL_SIZE >= paddle_y && self.ball_y <= paddle_y + PADDLE_HEIGHT
    }

    // vertical speed depends on how far from the paddle centre the ball lands
    fn spin(&self, paddle_y: f64) -> f64 {
        let offset = (paddle_y + PADDLE_HEIGHT / 2.0) - (self.ball_y + BALL_SIZE / 2.0);
        -offset * SPIN
    }

    fn draw(&mut self) {
        let screen = &mut self.screen;
        screen.clear();

        screen.fill_rect(
            0,
            self.left_paddle_y as i32,
            PADDLE_WIDTH as i32,
            PADDLE_HEIGHT as i32,
            WHITE,
        );
        screen.fill_rect(
            (SCREEN_WIDTH - PADDLE_WIDTH) as i32,
            self.right_paddle_y as i32,
            PADDLE_WIDTH as i32,
            PADDLE_HEIGHT as i32,
            WHITE,
        );
        screen.fill_rect(
            self.ball_x as i32,
            self.ball_y as i32,
            BALL_SIZE as i32,
            BALL_SIZE as i32,
            WHITE,
        );

        let mid = Framebuffer::WIDTH as i32 / 2;
        for y in (0..Framebuffer::HEIGHT as i32).step_by(8) {
            screen.fill_rect(mid - 1, y, 2, 4, WHITE);
        }

        Self::draw_score(screen, self.left_score, Framebuffer::WIDTH as i32 / 4);
        Self::draw_score(screen, self.right_score, 3 * Framebuffer::WIDTH as i32 / 4);
    }

    fn draw_score(screen: &mut Framebuffer, score: usize, center_x: i32) {
        let n_digits = score.to_string().len() as i32;
        screen.draw_number(score, center_x - n_digits * 6 / 2, 20, 8, WHITE);
    }

    fn info(&self) -> Info {
        let mut info = Info::new();
        info.insert("left_score".to_string(), self.left_score.into());
        info.insert("right_score".to_string(), self.right_score.into());
        info.insert("ball_x".to_string(), self.ball_x.into());
        info.insert("ball_y".to_string(), self.ball_y.into());

        info
    }
}

impl Env<Framebuffer, usize> for PongEnv {
    fn step(&mut self, action: &usize) -> EnvObservation<Framebuffer> {
        self.steps += 1;
        let mut reward = 0.0;

        match *action {
            UP => self.right_paddle_y = (self.right_paddle_y - PADDLE_SPEED).max(0.0),
            DOWN => {
                self.right_paddle_y =
                    (self.right_paddle_y + PADDLE_SPEED).min(SCREEN_HEIGHT - PADDLE_HEIGHT)
            }
            _ => {}
        }

        self.move_opponent();

        self.ball_x += self.ball_vel_x;
        self.ball_y += self.ball_vel_y;

        if self.ball_y <= 0.0 || self.ball_y >= SCREEN_HEIGHT - BALL_SIZE {
            self.ball_vel_y = -self.ball_vel_y;
            self.ball_y = self.ball_y.clamp(0.0, SCREEN_HEIGHT - BALL_SIZE);
        }

        if self.ball_x <= PADDLE_WIDTH && self.hits_paddle(self.left_paddle_y) {
            self.ball_vel_x = self.ball_vel_x.abs();
            self.ball_vel_y = self.spin(self.left_paddle_y);
        }

        if self.ball_x + BALL_SIZE >= SCREEN_WIDTH - PADDLE_WIDTH
            && self.hits_paddle(self.right_paddle_y)
        {
            self.ball_vel_x = -self.ball_vel_x.abs();
            self.ball_vel_y = self.spin(self.right_paddle_y);
        }

        if self.ball_x < 0.0 {
            self.right_score += 1;
            reward = 1.0;
            self.serve();
        } else if self.ball_x > SCREEN_WIDTH {
            self.left_score += 1;
            reward = -1.0;
            self.serve();
        }

        let done = self.left_score >= self.winning_score
            || self.right_score >= self.winning_score
            || self.steps >= self.max_steps;

        if done {
            match self.steps_beyond_done {
                None => self.steps_beyond_done = Some(0),
                Some(0) => {
                    warn!("stepping Pong after the match ended; call reset() first");
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
        self.serve();
        self.left_paddle_y = SCREEN_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
        self.right_paddle_y = SCREEN_HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
        self.left_score = 0;
        self.right_score = 0;
        self.steps = 0;
        self.steps_beyond_done = None;

        self.draw();
        self.screen.clone()
    }

    fn render(&self, mode: RenderMode) {
        if mode == RenderMode::Human {
            render_header("Pong");
            println!("Left: {}, Right: {}", self.left_score, self.right_score);
            println!(
                "Ball: ({:.1}, {:.1}) Velocity: ({:.1}, {:.1})",
                self.ball_x, self.ball_y, self.ball_vel_x, self.ball_vel_y
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
            low: -1.0,
            high: 1.0,
        }
    }

    fn spec(&self) -> Option<EnvSpec> {
        Some(EnvSpec::new("Pong-v4").with_max_episode_steps(self.max_steps))
    }

    fn metadata(&self) -> Metadata {
        arcade_metadata()
    }

    fn unwrapped(&self) -> &dyn Env<Framebuffer, usize> {
        self
    }
}
