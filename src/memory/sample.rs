//! Built-in sample program: three LEDs on PORTB0-PORTB2 blinking in turn.

use crate::cpu::decode::{encode, Instruction, InstructionWord};
use crate::cpu::registers::{R16, R17, R18, R19};
use crate::memory::data::{DDRB, PORTB, PORTB0, PORTB1, PORTB2};
use crate::memory::program::Program;

pub const RESET_VECT: u8 = 0;
pub const MAIN: u8 = 8;
pub const MAIN_LOOP: u8 = 9;
pub const LED_BLINK: u8 = 11;
pub const SETUP: u8 = 16;
pub const INIT_PORTS: u8 = 19;
pub const INIT_REGISTERS: u8 = 22;
pub const END: u8 = 26;

pub const LED1: u8 = 1 << PORTB0;
pub const LED2: u8 = 1 << PORTB1;
pub const LED3: u8 = 1 << PORTB2;

/// The LED blink program with its subroutine table.
pub fn blink() -> Program {
    use Instruction::*;

    let mut words: Vec<InstructionWord> = Vec::with_capacity(END as usize);

    // RESET_vect: jump to main, pad the vector table with NOPs.
    words.push(encode(&Jmp { target: MAIN }));
    words.extend(std::iter::repeat(encode(&Nop)).take((MAIN - 1) as usize));

    // main
    words.push(encode(&Call { target: SETUP }));
    // main_loop
    words.push(encode(&Call { target: LED_BLINK }));
    words.push(encode(&Jmp { target: MAIN_LOOP }));

    // led_blink
    words.push(encode(&Out { io: PORTB, reg: R16 }));
    words.push(encode(&Out { io: PORTB, reg: R17 }));
    words.push(encode(&Out { io: PORTB, reg: R18 }));
    words.push(encode(&Out { io: PORTB, reg: R19 }));
    words.push(encode(&Ret));

    // setup
    words.push(encode(&Call { target: INIT_PORTS }));
    words.push(encode(&Call { target: INIT_REGISTERS }));
    words.push(encode(&Ret));

    // init_ports
    words.push(encode(&Ldi { reg: R16, value: LED1 | LED2 | LED3 }));
    words.push(encode(&Out { io: DDRB, reg: R16 }));
    words.push(encode(&Ret));

    // init_registers
    words.push(encode(&Ldi { reg: R16, value: LED1 }));
    words.push(encode(&Ldi { reg: R17, value: LED2 }));
    words.push(encode(&Ldi { reg: R18, value: LED3 }));
    words.push(encode(&Ret));

    debug_assert_eq!(words.len(), END as usize);

    let range = |start: u8, end: u8| (u16::from(start), u16::from(end));
    let labels = [
        ("RESET_vect", range(RESET_VECT, MAIN)),
        ("main", range(MAIN, LED_BLINK)),
        ("led_blink", range(LED_BLINK, SETUP)),
        ("setup", range(SETUP, INIT_PORTS)),
        ("init_ports", range(INIT_PORTS, INIT_REGISTERS)),
        ("init_registers", range(INIT_REGISTERS, END)),
    ];

    labels
        .into_iter()
        .fold(Program::new(words), |program, (name, (start, end))| {
            program.with_subroutine(name, start, end)
        })
}
