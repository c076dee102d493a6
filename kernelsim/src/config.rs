use std::time::Duration;

use clap::{Parser, Subcommand};

/// Design knobs exposed as CLI flags rather than compile-time constants. Defaults match the
/// original C program.
#[derive(Parser, Debug, Clone)]
#[command(name = "kernelsim", about = "Preemptive round-robin micro-kernel simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub role: Option<Role>,

    /// Number of application processes.
    #[arg(long, default_value_t = 5, global = true)]
    pub apps: u32,

    /// Scheduler quantum, in milliseconds.
    #[arg(long, default_value_t = 500, global = true)]
    pub quantum_ms: u64,

    /// Instruction budget per application before it emits DONE.
    #[arg(long, default_value_t = 20, global = true)]
    pub max_pc: i32,

    /// An app issues a syscall with probability `1/syscall_prob` each tick.
    #[arg(long, default_value_t = 10, global = true)]
    pub syscall_prob: u32,

    /// Probability (0.0..=1.0) that the controller raises IRQ1 each quantum.
    #[arg(long, default_value_t = 0.333_333, global = true)]
    pub irq1_prob: f64,

    /// Probability (0.0..=1.0) that the controller raises IRQ2 each quantum.
    #[arg(long, default_value_t = 0.2, global = true)]
    pub irq2_prob: f64,

    /// SFSS host to send syscalls to.
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub sfss_host: String,

    /// SFSS UDP port.
    #[arg(long, default_value_t = 8888, global = true)]
    pub sfss_port: u16,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Role {
    /// Run as the interrupt controller.
    Inter {
        /// OS pid of the kernel process to signal.
        #[arg(long)]
        kernel_pid: i32,
    },
    /// Run as one application.
    App {
        /// Logical id, 1..=N.
        id: u32,
        /// OS pid of the kernel process to signal.
        #[arg(long)]
        kernel_pid: i32,
    },
}

impl Cli {
    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.quantum_ms)
    }

    pub fn sfss_addr(&self) -> String {
        format!("{}:{}", self.sfss_host, self.sfss_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_program() {
        let cli = Cli::parse_from(["kernelsim"]);
        assert_eq!(cli.apps, 5);
        assert_eq!(cli.quantum_ms, 500);
        assert_eq!(cli.max_pc, 20);
        assert_eq!(cli.syscall_prob, 10);
        assert_eq!(cli.sfss_port, 8888);
        assert!(cli.role.is_none());
    }

    #[test]
    fn role_subcommands_parse() {
        let cli = Cli::parse_from(["kernelsim", "inter", "--kernel-pid", "123"]);
        match cli.role {
            Some(Role::Inter { kernel_pid }) => assert_eq!(kernel_pid, 123),
            other => panic!("expected Inter, got {other:?}"),
        }

        let cli = Cli::parse_from(["kernelsim", "app", "3", "--kernel-pid", "123"]);
        match cli.role {
            Some(Role::App { id, kernel_pid }) => {
                assert_eq!(id, 3);
                assert_eq!(kernel_pid, 123);
            }
            other => panic!("expected App, got {other:?}"),
        }
    }
}
