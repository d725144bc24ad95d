//! HPGL Optimizer
//!
//! Removes instructions that cannot change what the plotter does.

use crate::hpgl::PlotterInstruction;

/// Instruction stream clean-up passes
#[derive(Debug)]
pub struct HpglOptimizer;

impl HpglOptimizer {
    /// Remove moves to the position the pen is already at
    pub fn remove_redundant_moves(instructions: &[PlotterInstruction]) -> Vec<PlotterInstruction> {
        let mut result = Vec::with_capacity(instructions.len());
        let mut position: Option<(i32, i32)> = None;

        for &instruction in instructions {
            if let PlotterInstruction::MoveAbsolute { x, y } = instruction {
                if position == Some((x, y)) {
                    continue;
                }
                position = Some((x, y));
            }
            result.push(instruction);
        }

        result
    }

    /// Remove pen-up/pen-down that repeat the current pen state
    pub fn remove_redundant_pen_states(
        instructions: &[PlotterInstruction],
    ) -> Vec<PlotterInstruction> {
        let mut result = Vec::with_capacity(instructions.len());
        let mut last_state: Option<PlotterInstruction> = None;

        for &instruction in instructions {
            if matches!(
                instruction,
                PlotterInstruction::PenUp | PlotterInstruction::PenDown
            ) {
                if last_state == Some(instruction) {
                    continue;
                }
                last_state = Some(instruction);
            }
            result.push(instruction);
        }

        result
    }

    /// Remove pen selections of the pen already in the holder
    pub fn remove_redundant_pen_selects(
        instructions: &[PlotterInstruction],
    ) -> Vec<PlotterInstruction> {
        let mut result = Vec::with_capacity(instructions.len());
        let mut last_pen: Option<u8> = None;

        for &instruction in instructions {
            if let PlotterInstruction::SelectPen(pen) = instruction {
                if last_pen == Some(pen) {
                    continue;
                }
                last_pen = Some(pen);
            }
            result.push(instruction);
        }

        result
    }

    /// Run all passes
    pub fn optimize(instructions: &[PlotterInstruction]) -> Vec<PlotterInstruction> {
        let mut optimized = Self::remove_redundant_moves(instructions);
        optimized = Self::remove_redundant_pen_states(&optimized);
        optimized = Self::remove_redundant_pen_selects(&optimized);
        optimized
    }
}
