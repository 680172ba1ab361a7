//! Embedded worker driver for sandboxed code execution
//!
//! The worker is a small Python program spawned once per agent invocation.
//! It owns the invocation's namespace for its entire lifetime: variables
//! bound by one code fragment stay visible to the next, and everything is
//! discarded when the process exits. This is state isolation between
//! invocations, not a security boundary.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Driver program executed with `python3 -u -c`.
///
/// Speaks newline-delimited JSON over stdin/stdout:
///
/// ```text
/// host → worker   {"op": "init", "context": …}
///                 {"op": "exec", "code": …}
///                 {"op": "resume", "answer": …}
/// worker → host   {"event": "ready"}
///                 {"event": "recurse", "task": …}
///                 {"event": "done", "stdout": …, "error": …}
/// ```
///
/// While a fragment executes, `sys.stdout`/`sys.stderr` are redirected into
/// a capture buffer; the wire handles are bound before that redirection, so
/// a `recurse` suspension can still reach the host mid-execution. Faults
/// are reported as traceback text in the `done` event, never raised, and
/// namespace mutations made before a fault are kept.
pub(crate) const WORKER_PROGRAM: &str = r#"
import builtins
import io
import json
import sys
import traceback

WIRE_IN = sys.stdin
WIRE_OUT = sys.stdout
MAX_OUTPUT_CHARS = 8000

ALLOWED_IMPORT_ROOTS = {
    "collections", "decimal", "fractions", "functools", "itertools",
    "math", "random", "re", "statistics",
}

SAFE_BUILTINS = [
    "abs", "all", "any", "bool", "dict", "enumerate", "Exception",
    "filter", "float", "int", "isinstance", "len", "list", "map", "max",
    "min", "pow", "print", "range", "repr", "reversed", "round", "set",
    "sorted", "str", "sum", "tuple", "type", "ValueError", "zip",
]


def safe_import(name, globals=None, locals=None, fromlist=(), level=0):
    root = name.split(".")[0]
    if root not in ALLOWED_IMPORT_ROOTS:
        raise ImportError(
            "import %r is blocked; allowed roots: %s"
            % (name, sorted(ALLOWED_IMPORT_ROOTS))
        )
    return builtins.__import__(name, globals, locals, fromlist, level)


def send(message):
    WIRE_OUT.write(json.dumps(message) + "\n")
    WIRE_OUT.flush()


def recv():
    line = WIRE_IN.readline()
    if not line:
        sys.exit(0)
    return json.loads(line)


def recurse(task):
    send({"event": "recurse", "task": str(task)})
    reply = recv()
    return reply.get("answer", "")


def clip(text):
    if text is None or len(text) <= MAX_OUTPUT_CHARS:
        return text
    return text[:MAX_OUTPUT_CHARS] + "\n...[output truncated]"


def main():
    allowed = {name: getattr(builtins, name) for name in SAFE_BUILTINS}
    allowed["__import__"] = safe_import
    namespace = {"__builtins__": allowed}

    init = recv()
    namespace["context"] = init.get("context", "")
    namespace["recurse"] = recurse
    send({"event": "ready"})

    while True:
        message = recv()
        if message.get("op") != "exec":
            continue
        captured = io.StringIO()
        real_out, real_err = sys.stdout, sys.stderr
        sys.stdout = sys.stderr = captured
        error = None
        try:
            exec(message.get("code", ""), namespace)
        except Exception:
            error = traceback.format_exc()
        finally:
            sys.stdout, sys.stderr = real_out, real_err
        send({"event": "done", "stdout": clip(captured.getvalue()), "error": clip(error)})


main()
"#;

/// Spawn a worker process with piped stdio.
///
/// stderr is discarded: protocol-level failures surface through the wire
/// (or its closure), and worker-internal prints must not pollute it.
pub(crate) fn spawn_worker(python_bin: &str) -> io::Result<Child> {
    Command::new(python_bin)
        .arg("-u")
        .arg("-c")
        .arg(WORKER_PROGRAM)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}
