/*!
cpu::mod - Public facade for the 6502 CPU core.

Layout:

```text
state.rs        - register file, status flags, stack helpers.
table.rs        - 151-entry instruction table, decode/encode lookups.
addressing.rs   - fetch, operand resolution for all 13 modes.
execute.rs      - ALU helpers shared by the dispatch families.
dispatch/       - per-family semantics, driven by the table.
disasm.rs       - assembler-syntax rendering for trace logs.
core.rs         - `Cpu` facade: step / reset / nmi / irq.
```

Usage:
```ignore
use famicore::cpu::Cpu;

let mut cpu = Cpu::new();
cpu.reset(&mut bus)?;
let cycles = cpu.step(&mut bus)?;
```

Decimal mode is not implemented: the D flag is stored and pushed but ADC/SBC
always use binary arithmetic.
*/

pub mod addressing;
pub mod core;
pub mod disasm;
pub mod dispatch;
pub mod execute;
pub mod state;
pub mod table;

pub use crate::cpu::addressing::{DecodedInstruction, fetch};
pub use crate::cpu::core::Cpu;
pub use crate::cpu::state::{CpuState, Status};
pub use crate::cpu::table::{AddrMode, Instruction, Mnemonic, decode, encode};
