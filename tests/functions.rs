mod common;

use common::{failure, output};

#[test]
fn test_define_and_call() {
    assert_eq!(
        output("funcao dobro(x): retorne x*2\nmostre(dobro(5))\n"),
        "10\n"
    );
}

#[test]
fn test_return_without_value_is_none() {
    assert_eq!(
        output("funcao nada(): retorne\nmostre(nada())\n"),
        "None\n"
    );
}

#[test]
fn test_function_without_return_yields_none() {
    assert_eq!(output("funcao vazia(): passe\nmostre(vazia())\n"), "None\n");
}

#[test]
fn test_multiple_parameters() {
    assert_eq!(
        output("funcao soma3(a, b, c): retorne a + b + c\nmostre(soma3(1, 2, 3))\n"),
        "6\n"
    );
}

#[test]
fn test_wrong_arity_faults() {
    assert_eq!(failure("funcao f(x): retorne x\nf(1, 2)\n").kind, "TypeError");
    assert_eq!(failure("funcao f(x): retorne x\nf()\n").kind, "TypeError");
}

#[test]
fn test_recursion() {
    let source = "\
funcao fatorial(n):
    se n <= 1:
        retorne 1
    retorne n * fatorial(n - 1)
mostre(fatorial(6))
";
    assert_eq!(output(source), "720\n");
}

#[test]
fn test_runaway_recursion_is_an_ordinary_fault() {
    let failure = failure("funcao f(): retorne f()\nf()\n");
    assert_eq!(failure.kind, "RecursionError");
    assert!(failure.message.contains("recursion"));
}

#[test]
fn test_tuple_return() {
    let source = "\
funcao par(): retorne 1, 2
mostre(par())
";
    assert_eq!(output(source), "(1, 2)\n");
}

#[test]
fn test_closures_capture_defining_scope() {
    let source = "\
funcao soma_com(base):
    funcao soma(x):
        retorne base + x
    retorne soma
mais5 = soma_com(5)
mostre(mais5(3))
";
    assert_eq!(output(source), "8\n");
}

#[test]
fn test_nonlocal_counter() {
    let source = "\
funcao contador():
    total = 0
    funcao passo():
        nao_local total
        total += 1
        retorne total
    retorne passo
c = contador()
c()
c()
mostre(c())
";
    assert_eq!(output(source), "3\n");
}

#[test]
fn test_global_declaration() {
    let source = "\
x = 0
funcao incrementa():
    global x
    x = x + 1
incrementa()
incrementa()
mostre(x)
";
    assert_eq!(output(source), "2\n");
}

#[test]
fn test_assignment_without_global_shadows_locally() {
    let source = "\
x = 1
funcao troca():
    x = 99
troca()
mostre(x)
";
    assert_eq!(output(source), "1\n");
}

#[test]
fn test_lambda() {
    assert_eq!(output("dobra = lambda x: x * 2\nmostre(dobra(4))\n"), "8\n");
    assert_eq!(output("mostre((lambda: 7)())\n"), "7\n");
}

#[test]
fn test_functions_are_values() {
    let source = "\
funcao aplica(f, x): retorne f(x)
funcao triplo(n): retorne n * 3
mostre(aplica(triplo, 4))
";
    assert_eq!(output(source), "12\n");
}

#[test]
fn test_calling_a_non_callable_faults() {
    assert_eq!(failure("x = 3\nx()\n").kind, "TypeError");
}
