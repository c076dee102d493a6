use rand::Rng;
use rand::seq::SliceRandom;

/// Decides, for one instruction tick, whether the app issues a syscall and
/// which kind. The workload generator's own internals are deliberately
/// simple: uniform choice among the five syscall kinds, against the app's
/// own file, since only its observable contract (emit TICK or a syscall
/// line, then suspend itself) matters to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallChoice {
    Read,
    Write,
    Add,
    Rem,
    ListDir,
}

const CHOICES: [SyscallChoice; 5] = [
    SyscallChoice::Read,
    SyscallChoice::Write,
    SyscallChoice::Add,
    SyscallChoice::Rem,
    SyscallChoice::ListDir,
];

/// `true` with probability `1/syscall_prob`, i.e. this tick issues a syscall
/// instead of a plain TICK.
pub fn should_syscall(syscall_prob: u32, rng: &mut impl Rng) -> bool {
    syscall_prob > 0 && rng.gen_range(0..syscall_prob) == 0
}

pub fn choose_syscall(rng: &mut impl Rng) -> SyscallChoice {
    *CHOICES.choose(rng).expect("CHOICES is non-empty")
}

/// Render one syscall choice as the line the app writes to the kernel, for
/// app `id` at the given offset/instruction count against its own
/// namespace (`/A{id}`).
pub fn format_syscall_line(id: u32, pid: i32, choice: SyscallChoice, tick: i32) -> String {
    let path = format!("/A{id}");
    match choice {
        SyscallChoice::Read => format!("READ A{id} {pid} {path}/f 0"),
        SyscallChoice::Write => format!("WRITE A{id} {pid} {path}/f 0 TICK{tick}"),
        SyscallChoice::Add => format!("ADD A{id} {pid} {path} dir{tick}"),
        SyscallChoice::Rem => format!("REM A{id} {pid} {path} dir{tick}"),
        SyscallChoice::ListDir => format!("LISTDIR A{id} {pid} {path}"),
    }
}
