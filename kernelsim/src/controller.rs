use rand::Rng;

/// Decides, each quantum, which IRQ lines the interrupt controller emits.
/// `IRQ0` fires every quantum; `IRQ1`/`IRQ2` are independent Bernoulli draws.
/// Pure and RNG-injected so the cadence policy is testable without a real
/// timer or child process.
pub struct Controller {
    pub irq1_prob: f64,
    pub irq2_prob: f64,
}

impl Controller {
    pub fn new(irq1_prob: f64, irq2_prob: f64) -> Self {
        Self {
            irq1_prob,
            irq2_prob,
        }
    }

    /// The lines to emit for one quantum tick, in order.
    pub fn tick_lines(&self, rng: &mut impl Rng) -> Vec<&'static str> {
        let mut lines = vec!["IRQ0"];
        if rng.gen_bool(self.irq1_prob) {
            lines.push("IRQ1");
        }
        if rng.gen_bool(self.irq2_prob) {
            lines.push("IRQ2");
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn irq0_always_fires() {
        let controller = Controller::new(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(controller.tick_lines(&mut rng), vec!["IRQ0"]);
    }

    #[test]
    fn probability_one_always_includes_the_optional_irqs() {
        let controller = Controller::new(1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(controller.tick_lines(&mut rng), vec!["IRQ0", "IRQ1", "IRQ2"]);
    }
}
