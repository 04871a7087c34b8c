//! The dining philosophers demo. Philosophers sit around a table with one
//! chopstick between each pair and cannot eat without holding both
//! neighbouring chopsticks. They never talk to each other; a waiter
//! process arbitrates instead. Each philosopher shares two pipes with the
//! waiter: requests (`R` to pick up, `P` to put down) flow one way and
//! verdicts (`Y`/`N`) flow back. The waiter serves whoever has eaten least
//! first, so nobody starves.

use crate::libs::system_call::{
    close, exit, fork, nice, pipe, read, write, yield_now, STDOUT_FILENO,
};
use crate::libs::utils::itoa;

pub const NUM_PHILOSOPHERS: usize = 5;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Chopsticks {
    Idle,
    Requested,
    Holding,
}

fn write_philosopher_id(id: usize) {
    write(STDOUT_FILENO, b"\nPhilosopher ");
    let mut digits = [0u8; 10];
    write(STDOUT_FILENO, itoa(&mut digits, id as u32 + 1));
    write(STDOUT_FILENO, b" ");
}

fn think(id: usize) {
    write_philosopher_id(id);
    write(STDOUT_FILENO, b"is thinking");
}

fn request_chopsticks(id: usize, fd_write: i32) -> bool {
    let sent = write(fd_write, b"R");
    write_philosopher_id(id);
    write(STDOUT_FILENO, b"requests chopsticks");
    sent == 1
}

/// `None`: no reply yet. `Some(false)`: denied. `Some(true)`: granted.
fn waiter_reply(fd_read: i32) -> Option<bool> {
    let mut reply = [0u8; 1];
    if read(fd_read, &mut reply) != 1 {
        return None;
    }
    Some(reply[0] == b'Y')
}

fn eat(id: usize) {
    write_philosopher_id(id);
    write(STDOUT_FILENO, b"is eating");
}

fn put_down_chopsticks(id: usize, fd_write: i32) -> bool {
    let sent = write(fd_write, b"P");
    write_philosopher_id(id);
    write(STDOUT_FILENO, b"puts chopsticks down");
    sent == 1
}

fn philosopher(id: usize, fd_read: i32, fd_write: i32) -> ! {
    let mut status = Chopsticks::Idle;
    loop {
        think(id);

        if status == Chopsticks::Idle {
            if request_chopsticks(id, fd_write) {
                status = Chopsticks::Requested;
            }
            yield_now();
        }

        match waiter_reply(fd_read) {
            None => yield_now(),
            Some(false) => status = Chopsticks::Idle,
            Some(true) => {
                write_philosopher_id(id);
                write(STDOUT_FILENO, b"picks chopsticks up");
                status = Chopsticks::Holding;
                eat(id);
            }
        }

        if status == Chopsticks::Holding && put_down_chopsticks(id, fd_write) {
            status = Chopsticks::Idle;
        }
    }
}

/// Answer one pending message from philosopher `id`, if any.
fn serve(
    id: usize,
    fd_read: &[i32; NUM_PHILOSOPHERS],
    fd_write: &[i32; NUM_PHILOSOPHERS],
    chopstick_free: &mut [bool; NUM_PHILOSOPHERS],
    meals: &mut [u32; NUM_PHILOSOPHERS],
) {
    let mut request = [0u8; 1];
    if read(fd_read[id], &mut request) != 1 {
        return;
    }

    let left = id;
    let right = (id + 1) % NUM_PHILOSOPHERS;

    match request[0] {
        b'R' => {
            if chopstick_free[left] && chopstick_free[right] {
                if write(fd_write[id], b"Y") == 1 {
                    chopstick_free[left] = false;
                    chopstick_free[right] = false;
                    meals[id] += 1;
                }
            } else {
                write(fd_write[id], b"N");
            }
        }
        b'P' => {
            chopstick_free[left] = true;
            chopstick_free[right] = true;
        }
        _ => {
            write(STDOUT_FILENO, b"\nERROR: invalid request");
            exit(1);
        }
    }
}

#[no_mangle]
pub extern "C" fn main_philosophers() {
    write(STDOUT_FILENO, b"\nPhilosophers start");

    let mut fd_waiter_read = [0i32; NUM_PHILOSOPHERS];
    let mut fd_waiter_write = [0i32; NUM_PHILOSOPHERS];
    let mut chopstick_free = [true; NUM_PHILOSOPHERS];
    let mut meals = [0u32; NUM_PHILOSOPHERS];

    for i in 0..NUM_PHILOSOPHERS {
        let mut to_philosopher = [0i32; 2];
        let mut to_waiter = [0i32; 2];
        if pipe(&mut to_philosopher) < 0 || pipe(&mut to_waiter) < 0 {
            write(STDOUT_FILENO, b"\nERROR: pipe failed");
            exit(1);
        }

        fd_waiter_read[i] = to_waiter[0];
        fd_waiter_write[i] = to_philosopher[1];
        let fd_philosopher_read = to_philosopher[0];
        let fd_philosopher_write = to_waiter[1];

        match fork() {
            -1 => {
                write(STDOUT_FILENO, b"\nERROR: fork failed");
                exit(1);
            }
            0 => {
                // the child keeps only its own two pipe ends
                for j in 0..=i {
                    close(fd_waiter_write[j]);
                    close(fd_waiter_read[j]);
                }
                philosopher(i, fd_philosopher_read, fd_philosopher_write);
            }
            pid => {
                close(fd_philosopher_read);
                close(fd_philosopher_write);
                nice(pid, -1);
            }
        }
    }

    yield_now();

    loop {
        write(STDOUT_FILENO, b"\nWaiter");

        // serve the table in order of fewest meals eaten
        let mut served = [false; NUM_PHILOSOPHERS];
        for _ in 0..NUM_PHILOSOPHERS {
            let mut id = NUM_PHILOSOPHERS;
            for candidate in 0..NUM_PHILOSOPHERS {
                if served[candidate] {
                    continue;
                }
                if id == NUM_PHILOSOPHERS || meals[candidate] < meals[id] {
                    id = candidate;
                }
            }
            served[id] = true;
            serve(id, &fd_waiter_read, &fd_waiter_write, &mut chopstick_free, &mut meals);
        }

        yield_now();
    }
}
