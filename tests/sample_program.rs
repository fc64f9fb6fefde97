//! End-to-end run of the built-in LED blink program.

use cu8::asm::image::{parse_image, render_image};
use cu8::memory::data::{DDRB, PORTB};
use cu8::memory::sample;
use cu8::{assemble, Cpu, CpuState, Instruction};

fn cpu() -> Cpu {
    Cpu::new(sample::blink()).unwrap()
}

fn trace(cpu: &mut Cpu, cycles: usize) -> Vec<Instruction> {
    (0..cycles).map(|_| cpu.cycle().unwrap()).collect()
}

#[test]
fn test_setup_reaches_main_loop() {
    let mut cpu = cpu();
    let executed = trace(&mut cpu, 12);

    use Instruction::*;
    assert_eq!(
        executed,
        vec![
            Jmp { target: sample::MAIN },
            Call { target: sample::SETUP },
            Call { target: sample::INIT_PORTS },
            Ldi { reg: 16, value: 0b111 },
            Out { io: DDRB, reg: 16 },
            Ret,
            Call { target: sample::INIT_REGISTERS },
            Ldi { reg: 16, value: sample::LED1 },
            Ldi { reg: 17, value: sample::LED2 },
            Ldi { reg: 18, value: sample::LED3 },
            Ret,
            Ret,
        ]
    );

    assert_eq!(cpu.pc(), sample::MAIN_LOOP);
    assert_eq!(cpu.state(), CpuState::Fetch);
    assert!(cpu.stack.is_empty());
    assert_eq!(cpu.regs.get(16), 1);
    assert_eq!(cpu.regs.get(17), 2);
    assert_eq!(cpu.regs.get(18), 4);
    assert_eq!(cpu.data.read(u16::from(DDRB)), 7);
}

#[test]
fn test_led_blink_cycles_portb() {
    let mut cpu = cpu();
    trace(&mut cpu, 12);

    // CALL led_blink
    cpu.cycle().unwrap();
    assert_eq!(cpu.pc(), sample::LED_BLINK);
    assert_eq!(cpu.subroutine_name(), "main");

    let mut seen = Vec::new();
    for _ in 0..4 {
        cpu.cycle().unwrap();
        seen.push(cpu.data.read(u16::from(PORTB)));
    }
    // R19 is never initialized, so the last write turns every LED off
    assert_eq!(seen, vec![1, 2, 4, 0]);
    assert_eq!(cpu.subroutine_name(), "led_blink");

    // RET, then JMP main_loop
    trace(&mut cpu, 2);
    assert_eq!(cpu.pc(), sample::MAIN_LOOP);
    assert!(cpu.stack.is_empty());
}

#[test]
fn test_snapshot_during_setup() {
    let mut cpu = cpu();
    trace(&mut cpu, 4);

    let snap = cpu.snapshot();
    assert_eq!(snap.subroutine, "init_ports");
    assert_eq!(snap.instruction, "LDI");
    assert_eq!(snap.state, CpuState::Fetch);
    assert_eq!(snap.pc, sample::INIT_PORTS + 1);
    assert_eq!(snap.stack_depth, 2);
    assert_eq!(snap.registers[0].name, "R16");
    assert_eq!(snap.registers[0].value, 0b111);

    let report = snap.to_string();
    assert!(report.contains("Current subroutine:"));
    assert!(report.contains("init_ports"));
}

#[test]
fn test_demo_source_runs_like_builtin() {
    let source = include_str!("../demos/blink.asm");
    let program = assemble(source).unwrap();
    let reloaded = parse_image(&render_image(&program)).unwrap();

    let mut from_source = Cpu::new(reloaded).unwrap();
    let mut builtin = cpu();
    let a = trace(&mut from_source, 40);
    let b = trace(&mut builtin, 40);

    assert_eq!(a, b);
    assert_eq!(from_source.snapshot(), builtin.snapshot());
}
